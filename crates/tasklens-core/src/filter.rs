use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};

use crate::item::Item;

/// Completion-state filter applied
/// before pagination.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
  #[default]
  All,
  Completed,
  Pending
}

impl Filter {
  pub const ALL: [Filter; 3] = [
    Filter::All,
    Filter::Completed,
    Filter::Pending
  ];

  pub fn matches(
    self,
    item: &Item
  ) -> bool {
    match self {
      | Filter::All => true,
      | Filter::Completed => {
        item.completed
      }
      | Filter::Pending => {
        !item.completed
      }
    }
  }

  pub fn as_str(
    self
  ) -> &'static str {
    match self {
      | Filter::All => "all",
      | Filter::Completed => {
        "completed"
      }
      | Filter::Pending => "pending"
    }
  }
}

impl fmt::Display for Filter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Filter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let wanted =
      s.trim().to_ascii_lowercase();
    Filter::ALL
      .into_iter()
      .find(|f| f.as_str() == wanted)
      .ok_or_else(|| {
        anyhow!(
          "unknown filter '{s}'; \
           expected all, \
           completed or pending"
        )
      })
  }
}
