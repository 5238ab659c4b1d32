use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::{Error, ResourcePool, Result, corpus};

/// Raw dictionary bytes shared by every operation that compresses with a dictionary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dictionary {
    name: String,
    bytes: Box<[u8]>,
}

impl Dictionary {
    /// Creates a dictionary from its raw bytes.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a dictionary file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = corpus::read(path)?;

        tracing::info!(path = %path.display(), size = bytes.len(), "loaded dictionary");

        Ok(Self::new(path.display().to_string(), bytes))
    }

    /// Where the dictionary came from, typically a file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw dictionary contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Materialized forms of a [`Dictionary`], keyed by compression level.
///
/// Some codecs precompute level-specific structures from the raw dictionary bytes. Each level
/// gets its own [`ResourcePool`] so repeated calls at one level rotate through several
/// independent copies.
///
/// Looking up a level that was never materialized returns `None` instead of touching memory
/// that belongs to another level.
///
/// # Examples
///
/// ```
/// use framebench::LevelDictionaries;
///
/// let dictionaries =
///     LevelDictionaries::materialize(1..=3, 2, |level, slot| Ok::<_, String>((level, slot)))
///         .unwrap();
///
/// assert_eq!(dictionaries.for_iteration(2, 5), Some(&(2, 1)));
/// assert_eq!(dictionaries.for_iteration(4, 0), None);
/// ```
#[derive(Debug)]
pub struct LevelDictionaries<T> {
    levels: BTreeMap<i32, ResourcePool<T>>,
}

impl<T> LevelDictionaries<T> {
    /// Materializes `slots_per_level` copies for every level in `levels` by calling
    /// `factory(level, slot)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `levels` is empty or `slots_per_level` is zero.
    ///
    /// Returns [`Error::ResourceInit`] as soon as the factory fails.
    pub fn materialize<E, F>(
        levels: RangeInclusive<i32>,
        slots_per_level: usize,
        mut factory: F,
    ) -> Result<Self>
    where
        E: Display,
        F: FnMut(i32, usize) -> std::result::Result<T, E>,
    {
        if levels.is_empty() {
            return Err(Error::configuration(format!(
                "level range {}..={} is empty",
                levels.start(),
                levels.end()
            )));
        }

        let levels = levels
            .map(|level| {
                ResourcePool::materialize(slots_per_level, |slot| factory(level, slot))
                    .map(|pool| (level, pool))
                    .map_err(|e| match e {
                        Error::ResourceInit { resource, problem } => Error::ResourceInit {
                            resource: format!("dictionary for level {level}, {resource}"),
                            problem,
                        },
                        other => other,
                    })
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { levels })
    }

    /// The materialized dictionary for `level` in `slot`.
    #[must_use]
    pub fn get(&self, level: i32, slot: usize) -> Option<&T> {
        self.levels.get(&level)?.get(slot)
    }

    /// The materialized dictionary for `level` that serves `iteration`.
    #[must_use]
    pub fn for_iteration(&self, level: i32, iteration: u64) -> Option<&T> {
        self.levels
            .get(&level)
            .map(|pool| pool.for_iteration(iteration))
    }

    /// Whether dictionaries were materialized for `level`.
    #[must_use]
    pub fn contains_level(&self, level: i32) -> bool {
        self.levels.contains_key(&level)
    }

    /// The materialized levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = i32> {
        self.levels.keys().copied()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn covers_negative_levels_without_offsets() {
        let dictionaries =
            LevelDictionaries::materialize(-3..=2, 1, |level, _| Ok::<_, String>(level * 100))
                .unwrap();

        assert_eq!(dictionaries.levels().collect::<Vec<_>>(), [-3, -2, -1, 0, 1, 2]);
        assert_eq!(dictionaries.get(-3, 0), Some(&-300));
        assert_eq!(dictionaries.get(2, 0), Some(&200));
        assert_eq!(dictionaries.get(3, 0), None);
        assert_eq!(dictionaries.get(-4, 0), None);
        assert!(dictionaries.contains_level(0));
        assert!(!dictionaries.contains_level(5));
    }

    #[test]
    fn rotates_slots_within_level() {
        let dictionaries =
            LevelDictionaries::materialize(5..=5, 3, |_, slot| Ok::<_, String>(slot)).unwrap();

        let slots = (0..6)
            .map(|iteration| *dictionaries.for_iteration(5, iteration).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(slots, [0, 1, 2, 0, 1, 2]);
        assert_eq!(dictionaries.get(5, 3), None);
    }

    #[test]
    fn empty_level_range_is_configuration_error() {
        #[expect(
            clippy::reversed_empty_ranges,
            reason = "testing what happens with an empty range"
        )]
        let result = LevelDictionaries::materialize(3..=1, 1, |_, _| Ok::<_, String>(()));

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn factory_failure_names_level() {
        let result = LevelDictionaries::materialize(1..=4, 2, |level, slot| {
            if level == 3 && slot == 1 {
                Err("dictionary too large")
            } else {
                Ok(())
            }
        });

        match result {
            Err(Error::ResourceInit { resource, problem }) => {
                assert_eq!(resource, "dictionary for level 3, pool slot 1 of 2");
                assert_eq!(problem, "dictionary too large");
            }
            other => panic!("expected ResourceInit, got {other:?}"),
        }
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict");
        fs::write(&path, b"dictionary bytes").unwrap();

        let dictionary = Dictionary::load(&path).unwrap();

        assert_eq!(dictionary.bytes(), b"dictionary bytes");
        assert!(dictionary.name().ends_with("dict"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Dictionary::load(&dir.path().join("missing")),
            Err(Error::Io { .. })
        ));
    }
}
