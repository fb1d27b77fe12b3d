use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static SPACE_GROUP_OPERATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Found\s*(\d+) space group operations")
        .expect("space group operations regex is valid")
});

static POINT_SYMMETRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"point symmetry (.*?)\s*\.").expect("point symmetry regex is valid")
});

static SPACE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"space group is (.*?)\s*\.").expect("space group regex is valid"));

static ELAPSED_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Elapsed time \(sec\):\s*([\d.]*?)\s").expect("elapsed time regex is valid")
});

/// Free-text solver log (`OUTCAR`), queried line-pattern by line-pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcarLog {
    content: String,
}

impl OutcarLog {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::new(String::from_utf8_lossy(&bytes)))
    }

    /// Largest operation count; the log reports the count once per symmetry
    /// analysis and the final analysis may see fewer operations.
    pub fn space_group_operations(&self) -> Option<usize> {
        SPACE_GROUP_OPERATIONS
            .captures_iter(&self.content)
            .filter_map(|hit| hit.get(1)?.as_str().parse::<usize>().ok())
            .max()
    }

    pub fn point_symmetry(&self) -> Option<&str> {
        first_capture(&POINT_SYMMETRY, &self.content)
    }

    pub fn space_group(&self) -> Option<&str> {
        first_capture(&SPACE_GROUP, &self.content)
    }

    pub fn elapsed_seconds(&self) -> Option<f64> {
        first_capture(&ELAPSED_TIME, &self.content)?.parse().ok()
    }
}

fn first_capture<'a>(pattern: &Regex, content: &'a str) -> Option<&'a str> {
    pattern
        .captures(content)
        .and_then(|hit| hit.get(1))
        .map(|value| value.as_str())
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub(crate) const IRON_LOG: &str = "\
 Analysis of symmetry for initial positions (statically):
 Subroutine PRICEL returns following result:
 Found     48 space group operations
 The static configuration has the point symmetry O_h .
 The point group associated with its full space group is O_h .

 Analysis of symmetry for dynamics (positions and initial velocities):
 Found     16 space group operations
 The dynamic configuration has the point symmetry D_4h.
 The point group associated with its full space group is D_4h.

 General timing and accounting informations for this job:
                  Total CPU time used (sec):      118.417
                            User time (sec):      115.320
                          System time (sec):        3.097
                         Elapsed time (sec):      120.502
";

    /// Relaxation log whose largest operation count is neither first nor last.
    pub(crate) const RELAXED_LOG: &str = "\
 Analysis of symmetry for initial positions (statically):
 Found     16 space group operations
 The static configuration has the point symmetry D_4h.
 The point group associated with its full space group is D_4h.

 Analysis of symmetry for initial positions (statically):
 Found     48 space group operations
 The static configuration has the point symmetry O_h .
 The point group associated with its full space group is O_h .

 Analysis of symmetry for dynamics (positions and initial velocities):
 Found     16 space group operations
 The dynamic configuration has the point symmetry D_4h.
 The point group associated with its full space group is D_4h.
                         Elapsed time (sec):       64.250
";
}
