use crate::payload::SubmittedItem;

pub const FEEDBACK_JUSTIFICATION: &str = "mean of employer feedback";

/// `raw / max * 100`; `None` for an item without a scale.
pub fn percentage(raw_score: f64, max_score: f64) -> Option<f64> {
    (max_score > 0.0).then(|| raw_score / max_score * 100.0)
}

/// Running sums over one branch of a survey batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTally {
    pub raw_sum: f64,
    pub max_sum: f64,
    pub titles: Vec<String>,
}

impl BatchTally {
    fn add(&mut self, item: &SubmittedItem) {
        self.raw_sum += item.raw_score;
        self.max_sum += item.max_score;
        self.titles.push(item.title.clone());
    }

    /// Batch percentage, `None` when the branch carries no scale at all.
    pub fn percentage(&self) -> Option<f64> {
        (self.max_sum > 0.0).then(|| self.raw_sum / self.max_sum * 100.0)
    }
}

/// A survey batch split into its three kinds of items.
#[derive(Debug, Default)]
pub struct SurveyPartition<'a> {
    pub test: Vec<&'a SubmittedItem>,
    pub feedback: Vec<&'a SubmittedItem>,
    pub qualitative: Vec<&'a SubmittedItem>,
}

impl<'a> SurveyPartition<'a> {
    pub fn new(items: &'a [SubmittedItem]) -> Self {
        let mut partition = Self::default();
        for item in items {
            if !item.is_feedback_item {
                partition.test.push(item);
            } else if item.is_qualitative_only() {
                partition.qualitative.push(item);
            } else {
                partition.feedback.push(item);
            }
        }
        partition
    }

    pub fn test_tally(&self) -> BatchTally {
        tally(&self.test)
    }

    pub fn feedback_tally(&self) -> BatchTally {
        tally(&self.feedback)
    }
}

fn tally(items: &[&SubmittedItem]) -> BatchTally {
    let mut tally = BatchTally::default();
    for item in items {
        tally.add(item);
    }
    tally
}
