//! Content negotiation over the `Accept` header.

use gqlhttp_core::media::TEXT_HTML;
use gqlhttp_core::{MediaType, ProtocolError, ProtocolResult};
use http::header::ACCEPT;
use http::{HeaderMap, Method};
use mediatype::MediaTypeList;

/// One media range of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
struct AcceptRange {
    ty: String,
    /// Subtype with its `+suffix`, if any.
    subty: String,
    quality: f32,
    order: usize,
}

impl AcceptRange {
    /// Specificity of the match against `essence`: 2 exact, 1 `type/*`, 0 `*/*`.
    fn specificity(&self, essence: &str) -> Option<u8> {
        let (ty, subty) = essence.split_once('/')?;
        if self.ty == "*" {
            return (self.subty == "*").then_some(0);
        }
        if !self.ty.eq_ignore_ascii_case(ty) {
            return None;
        }
        if self.subty == "*" {
            return Some(1);
        }
        self.subty.eq_ignore_ascii_case(subty).then_some(2)
    }
}

fn accept_ranges(headers: &HeaderMap) -> Vec<AcceptRange> {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(MediaTypeList::new)
        .flatten()
        .enumerate()
        .map(|(order, mime)| {
            let subty = match &mime.suffix {
                Some(suffix) => format!("{}+{}", mime.subty.as_str(), suffix.as_str()),
                None => mime.subty.as_str().to_string(),
            };
            let quality = mime
                .params
                .iter()
                .find(|(name, _)| name.as_str().eq_ignore_ascii_case("q"))
                .and_then(|(_, value)| value.as_str().parse::<f32>().ok())
                .map_or(1.0, |q| q.clamp(0.0, 1.0));

            AcceptRange {
                ty: mime.ty.as_str().to_ascii_lowercase(),
                subty: subty.to_ascii_lowercase(),
                quality,
                order,
            }
        })
        .collect()
}

struct Candidate {
    media: MediaType,
    quality: f32,
    specificity: u8,
    order: usize,
    index: usize,
}

/// Picks the response media type from the `Accept` header.
///
/// Without an `Accept` header the legacy `application/json` is used. Otherwise
/// each supported type takes the quality of its most specific matching range;
/// the highest quality wins, then the more specific match, then the range the
/// client listed first, then server preference.
pub fn negotiate(headers: &HeaderMap) -> ProtocolResult<MediaType> {
    if !headers.contains_key(ACCEPT) {
        return Ok(MediaType::ApplicationJson);
    }

    let ranges = accept_ranges(headers);
    MediaType::SUPPORTED
        .into_iter()
        .enumerate()
        .filter_map(|(index, media)| {
            let (specificity, range) = ranges
                .iter()
                .filter_map(|range| range.specificity(media.as_str()).map(|s| (s, range)))
                .max_by(|(sa, a), (sb, b)| {
                    sa.cmp(sb)
                        .then(a.quality.total_cmp(&b.quality))
                        .then(b.order.cmp(&a.order))
                })?;

            (range.quality > 0.0).then_some(Candidate {
                media,
                quality: range.quality,
                specificity,
                order: range.order,
                index,
            })
        })
        .min_by(|a, b| {
            b.quality
                .total_cmp(&a.quality)
                .then(b.specificity.cmp(&a.specificity))
                .then(a.order.cmp(&b.order))
                .then(a.index.cmp(&b.index))
        })
        .map(|candidate| candidate.media)
        .ok_or_else(ProtocolError::not_acceptable)
}

/// Returns true for a `GET` whose `Accept` lists `text/html`, parameters ignored.
pub fn is_playground_request(method: &Method, headers: &HeaderMap) -> bool {
    *method == Method::GET
        && accept_ranges(headers)
            .iter()
            .any(|range| range.specificity(TEXT_HTML) == Some(2))
}
