use crate::constants;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;
use memchr::memmem;
use std::convert::TryFrom;

/// Parses the header lines of one part into a [`HeaderMap`].
///
/// `block` holds the lines between the boundary line and the empty line, each
/// terminated by CRLF. Lines starting with a space or tab continue the
/// previous header and are joined onto it before the block is handed to
/// `httparse`.
pub(crate) fn parse_header_block(block: &[u8]) -> crate::Result<HeaderMap> {
    let unfolded = unfold_header_block(block);

    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(&unfolded, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => convert_raw_headers_to_header_map(raw_headers),
        Ok(httparse::Status::Partial) => Err(crate::Error::IncompleteHeaders),
        Err(err) => Err(crate::Error::ReadHeaderFailed(err)),
    }
}

fn unfold_header_block(block: &[u8]) -> Vec<u8> {
    let mut unfolded = Vec::with_capacity(block.len() + constants::CRLF.len());
    let mut start = 0;

    let ends = memmem::find_iter(block, constants::CRLF).chain(std::iter::once(block.len()));

    for end in ends {
        if start >= end {
            start = end + constants::CRLF.len();
            continue;
        }

        let line = &block[start..end];
        start = end + constants::CRLF.len();

        if line[0] == constants::SPACE || line[0] == constants::TAB {
            if unfolded.is_empty() {
                log::debug!("ignoring continuation line without a preceding header");
                continue;
            }
            unfolded.truncate(unfolded.len() - constants::CRLF.len());
        }

        unfolded.extend_from_slice(line);
        unfolded.extend_from_slice(constants::CRLF);
    }

    unfolded.extend_from_slice(constants::CRLF);
    unfolded
}

pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header]) -> crate::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: err.into(),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|err| crate::Error::DecodeHeaderValue {
            value: raw_header.value.to_owned(),
            cause: err.into(),
        })?;

        headers.append(name, value);
    }

    Ok(headers)
}
