//! Character employment history.

/// Corporation names a character has belonged to, most recent first.
///
/// Built from `(corporation_id, name)` pairs so that repeated stints in the
/// same corporation collapse to the first (most recent) occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmploymentHistory {
    corporations: Vec<String>,
}

impl EmploymentHistory {
    /// Build from corporation ids, most recent first, resolving each unique
    /// id through `name_of`. Ids with no known name are dropped.
    pub fn from_ids<F>(ids: &[i64], mut name_of: F) -> Self
    where
        F: FnMut(i64) -> Option<String>,
    {
        let mut seen: Vec<i64> = Vec::with_capacity(ids.len());
        let mut corporations = Vec::new();
        for &id in ids {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if let Some(name) = name_of(id) {
                corporations.push(name);
            }
        }
        Self { corporations }
    }

    /// Build from names that are already unique and ordered.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            corporations: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn corporations(&self) -> &[String] {
        &self.corporations
    }

    pub fn len(&self) -> usize {
        self.corporations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corporations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.corporations.iter()
    }
}
