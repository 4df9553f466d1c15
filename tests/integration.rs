use bytes::Bytes;
use form_params::{ChunkSource, Constraints, Error, ErrorKind, FormParser, Map, SizeLimit, Value};
use std::io;

const BASIC: &str = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

fn one_byte_chunks(data: &str) -> ChunkSource<impl Iterator<Item = Result<Bytes, io::Error>> + '_> {
    ChunkSource::new(
        data.as_bytes()
            .iter()
            .map(|byte| Ok(Bytes::copy_from_slice(&[*byte]))),
    )
}

#[test]
fn test_multipart_basic() {
    let mut params = Map::new();
    form_params::parse_multipart("multipart/form-data; boundary=X-BOUNDARY", one_byte_chunks(BASIC), &mut params)
        .unwrap();

    assert_eq!(params.keys().collect::<Vec<_>>(), vec!["My Field", "File Field"]);
    assert_eq!(params.get("My Field").and_then(Value::as_str), Some("abcd"));

    let file = params.get("File Field").and_then(Value::as_object).unwrap();
    assert_eq!(file.get("name").and_then(Value::as_str), Some("File Field"));
    assert_eq!(file.get("filename").and_then(Value::as_str), Some("a-text-file.txt"));
    assert_eq!(file.get("contentType").and_then(Value::as_str), Some("text/plain"));
    assert_eq!(
        file.get("value").and_then(Value::as_bytes),
        Some(&b"Hello world\nHello\r\nWorld\rAgain"[..])
    );
}

#[test]
fn test_multipart_empty() {
    let mut params = Map::new();
    form_params::parse_multipart("multipart/form-data; boundary=X-BOUNDARY", one_byte_chunks("--X-BOUNDARY--\r\n"), &mut params)
        .unwrap();

    assert!(params.is_empty());
}

#[test]
fn test_multipart_same_result_for_any_chunking() {
    let content_type = "multipart/form-data; boundary=X-BOUNDARY";

    let mut whole = Map::new();
    form_params::parse_multipart(content_type, BASIC.as_bytes(), &mut whole).unwrap();

    for buffer_size in [1, 5, 13, 64] {
        let mut params = Map::new();
        FormParser::new()
            .buffer_size(buffer_size)
            .parse_multipart(content_type, one_byte_chunks(BASIC), &mut params)
            .unwrap();

        assert_eq!(params, whole, "buffer size {}", buffer_size);
    }
}

#[test]
fn test_multipart_stream_error() {
    let chunks = vec![
        Ok(Bytes::from_static(
            b"--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--X-BOUNDARY\r\n",
        )),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
    ];

    // A small window so the first part completes before the failing read.
    let mut params = Map::new();
    let err = FormParser::new()
        .buffer_size(16)
        .parse_multipart(
            "multipart/form-data; boundary=X-BOUNDARY",
            ChunkSource::new(chunks.into_iter()),
            &mut params,
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Stream);
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(params.get("a").and_then(Value::as_str), Some("1"));
}

#[test]
fn test_multipart_constraints() {
    let parser = FormParser::new().constraints(
        Constraints::new()
            .allowed_fields(vec!["My Field", "File Field"])
            .size_limit(SizeLimit::new().for_field("File Field", 8)),
    );

    let mut params = Map::new();
    let err = parser
        .parse_multipart("multipart/form-data; boundary=X-BOUNDARY", one_byte_chunks(BASIC), &mut params)
        .unwrap_err();

    assert_eq!(
        err,
        Error::FieldSizeExceeded {
            limit: 8,
            field_name: Some("File Field".to_owned()),
        }
    );
    assert_eq!(err.kind(), ErrorKind::Limit);
    assert_eq!(params.get("My Field").and_then(Value::as_str), Some("abcd"));
}

#[test]
fn test_multipart_spools_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let parser = FormParser::new().sink_factory(form_params::temp_file_sink_in(dir.path()));

    let mut params = Map::new();
    parser
        .parse_multipart("multipart/form-data; boundary=X-BOUNDARY", one_byte_chunks(BASIC), &mut params)
        .unwrap();

    let path = params
        .get("File Field")
        .and_then(|file| file.pointer(&["value"]))
        .and_then(Value::as_path)
        .unwrap();
    assert!(path.starts_with(dir.path()));
    assert_eq!(std::fs::read(path).unwrap(), b"Hello world\nHello\r\nWorld\rAgain");
}

#[test]
fn test_multipart_charset() {
    let body = "--X\r\nContent-Disposition: form-data; name=\"latin\"\r\n\r\ncaf\u{e9}\r\n--X--";
    let latin1 = encoding_rs::WINDOWS_1252.encode(body).0;

    let mut params = Map::new();
    FormParser::new()
        .encoding("iso-8859-1")
        .parse_multipart("multipart/form-data; boundary=X", &latin1[..], &mut params)
        .unwrap();

    assert_eq!(params.get("latin").and_then(Value::as_str), Some("caf\u{e9}"));
}

#[test]
fn test_query_and_body_compose() {
    let parser = FormParser::new();
    let mut params = Map::new();

    parser.parse_urlencoded(b"user[name]=alice&tags[]=a", &mut params);
    parser
        .parse_body(
            "multipart/form-data; boundary=X",
            one_byte_chunks(
                "--X\r\nContent-Disposition: form-data; name=\"user[age]\"\r\n\r\n30\r\n\
                 --X\r\nContent-Disposition: form-data; name=\"tags[]\"\r\n\r\nb\r\n--X--",
            ),
            &mut params,
        )
        .unwrap();

    let user = params.get("user").and_then(Value::as_object).unwrap();
    assert_eq!(user.get("name").and_then(Value::as_str), Some("alice"));
    assert_eq!(user.get("age").and_then(Value::as_str), Some("30"));
    assert_eq!(
        params.get("tags"),
        Some(&Value::from(vec![Value::from("a"), Value::from("b")]))
    );
}

#[test]
fn test_urlencoded_body() {
    let mut params = Map::new();
    FormParser::new()
        .parse_body(
            "application/x-www-form-urlencoded; charset=utf-8",
            one_byte_chunks("q=rust+lang&page=%32&empty="),
            &mut params,
        )
        .unwrap();

    assert_eq!(params.get("q").and_then(Value::as_str), Some("rust lang"));
    assert_eq!(params.get("page").and_then(Value::as_str), Some("2"));
    assert_eq!(params.get("empty").and_then(Value::as_str), Some(""));
}

#[test]
fn test_missing_boundary_is_not_an_error() {
    let mut params = Map::new();
    params.insert("kept", Value::from("yes"));

    form_params::parse_multipart("multipart/form-data", one_byte_chunks(BASIC), &mut params).unwrap();

    assert_eq!(params.len(), 1);
    assert_eq!(params.get("kept").and_then(Value::as_str), Some("yes"));
}
