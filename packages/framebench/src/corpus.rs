use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// One immutable input buffer of the corpus.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    name: String,
    data: Box<[u8]>,
}

#[allow(
    clippy::len_without_is_empty,
    reason = "a sample is never empty, so is_empty() would always be false"
)]
impl Sample {
    /// Creates a sample from a name and its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `data` is empty. Operations signal failure through
    /// their output size, which is only unambiguous for non-empty inputs.
    pub fn new(name: impl Into<String>, data: impl Into<Box<[u8]>>) -> Result<Self> {
        let name = name.into();
        let data = data.into();

        if data.is_empty() {
            return Err(Error::configuration(format!("sample '{name}' is empty")));
        }

        Ok(Self { name, data })
    }

    /// Where the sample came from, typically a file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The contents of the sample.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length of the sample in bytes. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// The non-empty, ordered set of samples that measured operations consume.
///
/// Call `i` of a batch uses sample `i mod len()`, so a corpus of several samples is cycled
/// through in order.
#[derive(Clone, Debug)]
pub struct Corpus {
    // Never empty.
    samples: Box<[Sample]>,
}

#[allow(
    clippy::len_without_is_empty,
    reason = "a corpus is never empty, so is_empty() would always be false"
)]
impl Corpus {
    /// Creates a corpus from samples, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if there are no samples.
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Result<Self> {
        let samples = samples.into_iter().collect::<Vec<_>>();

        if samples.is_empty() {
            return Err(Error::configuration("the corpus contains no samples"));
        }

        Ok(Self {
            samples: samples.into_boxed_slice(),
        })
    }

    /// Loads a corpus from the filesystem.
    ///
    /// A file becomes a corpus of one sample. A directory becomes a corpus of one sample per
    /// regular file directly inside it, ordered by file name. Empty files and subdirectories
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the path or any file in the directory cannot be read.
    ///
    /// Returns [`Error::Configuration`] if no non-empty sample was found.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if !metadata.is_dir() {
            let data = read(path)?;
            return Self::new([Sample::new(path.display().to_string(), data)?]);
        }

        let mut files = fs::read_dir(path)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|entry| entry.path()))
                    .collect::<std::io::Result<Vec<_>>>()
            })
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;

        files.retain(|file| file.is_file());
        files.sort();

        let mut samples = Vec::with_capacity(files.len());

        for file in files {
            let data = read(&file)?;

            if data.is_empty() {
                tracing::warn!(path = %file.display(), "skipping empty sample");
                continue;
            }

            samples.push(Sample::new(file.display().to_string(), data)?);
        }

        let corpus = Self::new(samples).map_err(|_| {
            Error::configuration(format!(
                "directory '{}' contains no non-empty files",
                path.display()
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            samples = corpus.len(),
            max_sample_len = corpus.max_sample_len(),
            "loaded corpus"
        );

        Ok(corpus)
    }

    /// Number of samples. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// The sample at `index`, or `None` if there is no such sample.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Iterates over the samples in order.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Length of the longest sample.
    #[must_use]
    pub fn max_sample_len(&self) -> usize {
        self.samples.iter().map(Sample::len).max().unwrap_or(0)
    }
}

pub(crate) fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
