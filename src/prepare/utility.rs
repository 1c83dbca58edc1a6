/// Running arithmetic mean that ignores nulls. `None` if nothing was seen.
#[derive(Debug, Default, Clone)]
pub struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Most frequent non-null value; ties go to the value seen first.
#[derive(Debug, Default, Clone)]
pub struct ModeAcc {
    counts: Vec<(String, usize)>,
}

impl ModeAcc {
    pub fn push(&mut self, value: Option<&str>) {
        let Some(v) = value else { return };
        match self.counts.iter_mut().find(|(seen, _)| seen == v) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((v.to_string(), 1)),
        }
    }

    pub fn mode(&self) -> Option<String> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(v, _)| v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_ignores_nulls() {
        let mut acc = MeanAcc::default();
        for v in [Some(10.0), Some(20.0), None] {
            acc.push(v);
        }
        assert_eq!(acc.mean(), Some(15.0));
    }

    #[test]
    fn test_mean_all_null_is_null() {
        let mut acc = MeanAcc::default();
        acc.push(None);
        assert_eq!(acc.mean(), None);
    }

    #[test]
    fn test_mode_most_frequent() {
        let mut acc = ModeAcc::default();
        for v in ["clear", "clear", "rain"] {
            acc.push(Some(v));
        }
        assert_eq!(acc.mode().as_deref(), Some("clear"));
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen() {
        let mut acc = ModeAcc::default();
        for v in [Some("rain"), None, Some("clear"), Some("clear"), Some("rain")] {
            acc.push(v);
        }
        assert_eq!(acc.mode().as_deref(), Some("rain"));
    }

    #[test]
    fn test_mode_empty_is_null() {
        assert_eq!(ModeAcc::default().mode(), None);
    }
}
