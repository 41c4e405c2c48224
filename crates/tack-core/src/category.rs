use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownCategory;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    // Aliases are the labels written by older builds.
    #[default]
    #[serde(alias = "Geral")]
    General,
    #[serde(alias = "Trabalho")]
    Work,
    #[serde(alias = "Estudo")]
    Study,
    #[serde(alias = "Pessoal")]
    Personal,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Work,
        Category::Study,
        Category::Personal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Work => "Work",
            Category::Study => "Study",
            Category::Personal => "Personal",
        }
    }

    fn legacy_label(self) -> &'static str {
        match self {
            Category::General => "Geral",
            Category::Work => "Trabalho",
            Category::Study => "Estudo",
            Category::Personal => "Pessoal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|cat| {
                cat.label().eq_ignore_ascii_case(wanted)
                    || cat.legacy_label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

/// Which slice of the store a view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(cat) => cat.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, CategoryFilter};

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("work".parse::<Category>().expect("work"), Category::Work);
        assert_eq!(" STUDY ".parse::<Category>().expect("study"), Category::Study);
        assert_eq!("Pessoal".parse::<Category>().expect("legacy"), Category::Personal);
        assert!("chores".parse::<Category>().is_err());
    }

    #[test]
    fn deserializes_legacy_labels_and_writes_current_ones() {
        let cat: Category = serde_json::from_str("\"Trabalho\"").expect("legacy label");
        assert_eq!(cat, Category::Work);
        assert_eq!(serde_json::to_string(&cat).expect("serialize"), "\"Work\"");
        assert!(serde_json::from_str::<Category>("\"Chores\"").is_err());
    }

    #[test]
    fn filter_all_matches_every_category() {
        let all: CategoryFilter = "All".parse().expect("all");
        assert_eq!(all, CategoryFilter::All);
        assert!(Category::ALL.into_iter().all(|cat| all.matches(cat)));

        let work: CategoryFilter = "work".parse().expect("work");
        assert!(work.matches(Category::Work));
        assert!(!work.matches(Category::General));
        assert_eq!(work.to_string(), "Work");
    }
}
