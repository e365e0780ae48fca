// User-type colours.
//
// The aggregator accepts any user type; only the renderers assume the two
// known ones. `Palette::resolve` is the single place where that assumption is
// checked, before anything is drawn.
use crate::error::ReportError;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

static KNOWN_COLORS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| HashMap::from([("casual", "#E76F51"), ("member", "#2A9D8F")]));

/// Colours handed out, in order, to user types without a mapping.
const FALLBACK_COLORS: [&str; 5] = ["#264653", "#E9C46A", "#8D99AE", "#6D597A", "#B5838D"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryPolicy {
    /// Unmapped user types get a colour from the fallback cycle.
    #[default]
    Fallback,
    /// Unmapped user types abort the report with `UnexpectedCategory`.
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: BTreeMap<String, String>,
}

impl Palette {
    /// Assign a colour to every user type in `user_types`.
    ///
    /// Fallback colours depend only on the sorted set of unmapped names, so the
    /// same dataset always renders the same way.
    pub fn resolve<S: AsRef<str>>(
        user_types: &[S],
        policy: CategoryPolicy,
    ) -> Result<Palette, ReportError> {
        let mut colors = BTreeMap::new();
        let mut unmapped = Vec::new();
        for u in user_types {
            let u = u.as_ref();
            match KNOWN_COLORS.get(u) {
                Some(c) => {
                    colors.insert(u.to_string(), c.to_string());
                }
                None => unmapped.push(u.to_string()),
            }
        }
        unmapped.sort();
        unmapped.dedup();

        if let Some(first) = unmapped.first() {
            if policy == CategoryPolicy::Strict {
                return Err(ReportError::UnexpectedCategory(first.clone()));
            }
        }
        for (i, u) in unmapped.into_iter().enumerate() {
            let c = FALLBACK_COLORS[i % FALLBACK_COLORS.len()];
            warn!(user_type = %u, color = c, "no colour mapping for user type; using fallback");
            colors.insert(u, c.to_string());
        }
        Ok(Palette { colors })
    }

    /// Colour for a user type; types never passed to `resolve` get neutral grey.
    pub fn color(&self, user_type: &str) -> &str {
        self.colors
            .get(user_type)
            .map(String::as_str)
            .unwrap_or("#999999")
    }
}
