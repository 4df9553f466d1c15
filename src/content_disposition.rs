use crate::urlencoded;
use encoding_rs::{Encoding, UTF_8};

/// The `name` and `filename` parameters of a `Content-Disposition` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    /// Parses the parameters of a header value such as
    /// `form-data; name="upload"; filename="a.txt"`.
    ///
    /// `filename*` (RFC 5987) wins over `filename` when both are present.
    pub fn parse(value: &str) -> ContentDisposition {
        let mut disposition = ContentDisposition::default();
        let mut extended_file_name = None;

        for param in split_params(value).into_iter().skip(1) {
            let (key, raw) = match param.split_once('=') {
                Some((key, raw)) => (key.trim(), raw.trim()),
                None => continue,
            };

            if key.eq_ignore_ascii_case("name") {
                disposition.field_name = Some(unquote(raw));
            } else if key.eq_ignore_ascii_case("filename") {
                disposition.file_name = Some(unquote(raw));
            } else if key.eq_ignore_ascii_case("filename*") {
                extended_file_name = decode_extended(&unquote(raw));
            }
        }

        if extended_file_name.is_some() {
            disposition.file_name = extended_file_name;
        }

        disposition
    }
}

/// Splits on `;` outside quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    params.push(&value[start..]);
    params
}

fn unquote(raw: &str) -> String {
    let inner = match raw.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => return raw.to_owned(),
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decodes `charset'language'percent-encoded-value`.
fn decode_extended(raw: &str) -> Option<String> {
    let mut pieces = raw.splitn(3, '\'');
    let charset = pieces.next()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;

    let encoding = Encoding::for_label(charset.as_bytes()).unwrap_or(UTF_8);
    let mut bytes = encoded.as_bytes().to_vec();
    urlencoded::decode_in_place(&mut bytes);
    let (text, _) = encoding.decode_without_bom_handling(&bytes);
    Some(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> (Option<String>, Option<String>) {
        let cd = ContentDisposition::parse(value);
        (cd.field_name, cd.file_name)
    }

    #[test]
    fn test_parse_field_name() {
        assert_eq!(parse(r#"form-data; name="my_field""#), (Some("my_field".to_owned()), None));
        assert_eq!(parse(r#"form-data; name="my field""#), (Some("my field".to_owned()), None));
        assert_eq!(parse("form-data; name=plain"), (Some("plain".to_owned()), None));
        assert_eq!(parse("form-data; NAME=\"你好\""), (Some("你好".to_owned()), None));
        assert_eq!(parse("form-data"), (None, None));
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse(r#"form-data; name="my_field"; filename="file name.txt""#),
            (Some("my_field".to_owned()), Some("file name.txt".to_owned()))
        );
        assert_eq!(
            parse(r#"form-data; filename="upload.txt"; name="f""#),
            (Some("f".to_owned()), Some("upload.txt".to_owned()))
        );
        assert_eq!(
            parse("form-data; name=\"f\"; filename=\"কখগ-你好.txt\""),
            (Some("f".to_owned()), Some("কখগ-你好.txt".to_owned()))
        );
        assert_eq!(parse(r#"form-data; name="f"; filename="""#), (Some("f".to_owned()), Some(String::new())));
    }

    #[test]
    fn test_parse_quoted_specials() {
        assert_eq!(
            parse(r#"form-data; name="a;b"; filename="say \"hi\".txt""#),
            (Some("a;b".to_owned()), Some(r#"say "hi".txt"#.to_owned()))
        );
    }

    #[test]
    fn test_parse_extended_file_name() {
        assert_eq!(
            parse("form-data; name=\"f\"; filename=\"fallback.txt\"; filename*=UTF-8''%e2%82%ac%20rates.txt"),
            (Some("f".to_owned()), Some("€ rates.txt".to_owned()))
        );
        assert_eq!(
            parse("form-data; name=\"f\"; filename*=iso-8859-1'en'caf%E9.txt"),
            (Some("f".to_owned()), Some("café.txt".to_owned()))
        );
    }
}
