use serde::{Deserialize, Serialize};

/// Proxy settings, merged field-wise: an absent field never overwrites a
/// present one, but a present field in a higher-precedence fragment always
/// wins (ground: `customization_provider_test.go`, where `http_proxy` stays
/// `parent2`'s value while `https_proxy` and `no_proxy` get overridden by
/// lower levels of the chain independently of each other).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub http_proxy: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub https_proxy: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub no_proxy: Option<String>,
}

impl Proxy {
  /// Merges `other` onto `self`, field by field. Fields present in `other`
  /// take precedence; fields absent in `other` leave `self` untouched.
  pub fn merge(&mut self, other: &Proxy) {
    if other.http_proxy.is_some() {
      self.http_proxy.clone_from(&other.http_proxy);
    }
    if other.https_proxy.is_some() {
      self.https_proxy.clone_from(&other.https_proxy);
    }
    if other.no_proxy.is_some() {
      self.no_proxy.clone_from(&other.no_proxy);
    }
  }

  pub fn is_empty(&self) -> bool {
    self.http_proxy.is_none()
      && self.https_proxy.is_none()
      && self.no_proxy.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merge_is_field_wise_last_writer_wins() {
    let mut p = Proxy {
      http_proxy: Some("http_proxy_parent2".into()),
      https_proxy: None,
      no_proxy: None,
    };
    p.merge(&Proxy {
      http_proxy: None,
      https_proxy: Some("https_proxy_comp1".into()),
      no_proxy: None,
    });
    p.merge(&Proxy {
      http_proxy: None,
      https_proxy: None,
      no_proxy: Some("no_proxy_parent1".into()),
    });

    assert_eq!(p.http_proxy.as_deref(), Some("http_proxy_parent2"));
    assert_eq!(p.https_proxy.as_deref(), Some("https_proxy_comp1"));
    assert_eq!(p.no_proxy.as_deref(), Some("no_proxy_parent1"));
  }

  #[test]
  fn absent_field_never_clobbers_present_one() {
    let mut p = Proxy {
      http_proxy: Some("keep-me".into()),
      ..Default::default()
    };
    p.merge(&Proxy::default());
    assert_eq!(p.http_proxy.as_deref(), Some("keep-me"));
  }
}
