//! Label tables and per-class bookkeeping.

/// Ordered, index-addressable list of class names.
///
/// The position of a label is its canonical class identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Creates a table from owned labels.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parses newline-separated text, one label per line.
    ///
    /// A trailing `\r` is stripped from each line and a final empty line is
    /// ignored; interior empty lines are kept so indices stay aligned.
    pub fn from_lines(text: &str) -> Self {
        Self {
            labels: text.lines().map(str::to_owned).collect(),
        }
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the table holds no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the label at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Iterates labels in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-class admission counter indexed by label position.
pub(crate) struct ClassCounter {
    counts: Vec<usize>,
    cap: usize,
}

impl ClassCounter {
    pub(crate) fn new(num_classes: usize, cap: usize) -> Self {
        Self {
            counts: vec![0; num_classes],
            cap,
        }
    }

    /// Counts one more detection of `class` unless the class is saturated.
    ///
    /// Returns false (and leaves the count unchanged) once `cap` detections of
    /// the class have been admitted. Callers pass indices below `num_classes`.
    pub(crate) fn admit(&mut self, class: usize) -> bool {
        let count = &mut self.counts[class];
        if *count >= self.cap {
            return false;
        }
        *count += 1;
        true
    }
}
