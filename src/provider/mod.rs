mod types;

#[cfg(feature = "deepseek")]
pub mod deepseek;
#[cfg(feature = "google")]
pub mod google;
pub mod stub;

pub use types::{GenerationParams, Prompt, Provider, Role, Turn};

/// Parse an API base URL so that relative endpoint paths join under it.
/// `https://proxy/v1` and `https://proxy/v1/` both end up as the latter.
#[cfg(any(feature = "deepseek", feature = "google"))]
fn base_url(raw: &str) -> anyhow::Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(all(test, any(feature = "deepseek", feature = "google")))]
mod tests {
    use super::base_url;

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(base_url("https://proxy.local/v1").unwrap().as_str(), "https://proxy.local/v1/");
        assert_eq!(base_url("https://proxy.local/v1/").unwrap().as_str(), "https://proxy.local/v1/");
        assert_eq!(base_url("https://api.deepseek.com").unwrap().as_str(), "https://api.deepseek.com/");
        assert_eq!(
            base_url("https://proxy.local/v1/")
                .unwrap()
                .join("chat/completions")
                .unwrap()
                .as_str(),
            "https://proxy.local/v1/chat/completions"
        );
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(base_url("not a url").is_err());
    }
}
