//! Recognition of post links and artwork source links.
use url::Url;

use crate::{PostHost, PostId, SourceHost, SourceId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostUrlError {
    #[error("not a valid URL: {0}")]
    Unparseable(String),
    #[error("{0} is not a post on a supported image board")]
    UnknownHost(String),
    #[error("could not find a post id in {0}")]
    MissingId(String),
}

/// Parse a link to a post on one of the known image boards.
///
/// Accepted shapes:
/// - `https://gelbooru.com/index.php?page=post&s=view&id=<n>`
/// - `https://danbooru.donmai.us/posts/<n>`
pub fn parse_post_url(input: &str) -> Result<(PostHost, PostId), PostUrlError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|_| PostUrlError::Unparseable(trimmed.to_string()))?;
    let hostname = url.host_str().unwrap_or_default().to_ascii_lowercase();

    let (host, post_id) = match hostname.as_str() {
        "gelbooru.com" | "www.gelbooru.com" => {
            let is_post_view = url.path() == "/index.php"
                && query_value(&url, "page").as_deref() == Some("post");
            let id = if is_post_view { query_value(&url, "id") } else { None };
            (PostHost::Gelbooru, id)
        }
        "danbooru.donmai.us" => {
            let mut segments = url.path_segments().into_iter().flatten();
            let id = match (segments.next(), segments.next()) {
                (Some("posts"), Some(id)) => Some(id.to_string()),
                _ => None,
            };
            (PostHost::Danbooru, id)
        }
        _ => return Err(PostUrlError::UnknownHost(trimmed.to_string())),
    };

    match post_id {
        Some(id) if is_numeric(&id) => Ok((host, id)),
        _ => Err(PostUrlError::MissingId(trimmed.to_string())),
    }
}

/// Extract the artwork id of `source_host` from a post's `source` field.
pub fn source_id_from_url(source_host: SourceHost, source: &str) -> Option<SourceId> {
    let url = Url::parse(source.trim()).ok()?;
    let hostname = url.host_str()?.to_ascii_lowercase();
    match source_host {
        SourceHost::Pixiv => match hostname.as_str() {
            "www.pixiv.net" | "pixiv.net" => {
                if let Some(id) = query_value(&url, "illust_id") {
                    return is_numeric(&id).then_some(id);
                }
                last_segment(&url).filter(|segment| is_numeric(segment))
            }
            // Image URLs: .../img/2020/01/01/00/00/00/12345_p0.png
            "i.pximg.net" => {
                let filename = last_segment(&url)?;
                let id = filename.split('_').next()?.to_string();
                is_numeric(&id).then_some(id)
            }
            _ => None,
        },
        SourceHost::Nijie => match hostname.as_str() {
            "nijie.info" | "www.nijie.info" => {
                let page = last_segment(&url)?;
                if page != "view.php" && page != "view_popup.php" {
                    return None;
                }
                query_value(&url, "id").filter(|id| is_numeric(id))
            }
            _ => None,
        },
    }
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(ToOwned::to_owned)
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_url_round_trips_through_parser() {
        for host in PostHost::ALL {
            let url = host.post_url("1234");
            assert_eq!(parse_post_url(&url), Ok((host, "1234".to_string())));
        }
    }

    #[test]
    fn nijie_popup_links_are_recognized() {
        assert_eq!(
            source_id_from_url(SourceHost::Nijie, "https://nijie.info/view_popup.php?id=77"),
            Some("77".to_string())
        );
        assert_eq!(
            source_id_from_url(SourceHost::Nijie, "https://nijie.info/members.php?id=77"),
            None
        );
    }
}
