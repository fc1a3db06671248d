use crate::marketplace::Timestamp;
use serde::{Deserialize, Serialize};

/// A single rating left for a freelancer. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub date: Timestamp,
}

/// Aggregated rating state for one freelancer.
///
/// `average_rating` is a cached derived value: it must always equal the
/// arithmetic mean of `entries`, and is recomputed on every insert. Mutate
/// entries only through [`FreelancerReputation::record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreelancerReputation {
    pub freelancer_id: String,
    pub entries: Vec<RatingEntry>,
    pub average_rating: f64,
}

impl FreelancerReputation {
    pub fn new(freelancer_id: String) -> Self {
        Self {
            freelancer_id,
            entries: Vec::new(),
            average_rating: 0.0,
        }
    }

    /// Append a rating entry and recompute the cached mean.
    pub fn record(&mut self, rating: u8, feedback: Option<String>, date: Timestamp) {
        self.entries.push(RatingEntry {
            rating,
            feedback,
            date,
        });
        let sum: u64 = self.entries.iter().map(|e| e.rating as u64).sum();
        self.average_rating = sum as f64 / self.entries.len() as f64;
    }
}

/// Roster entry for a freelancer. Earnings only ever grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freelancer {
    pub id: String,
    pub name: String,
    pub total_earnings: u64,
}

impl Freelancer {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            total_earnings: 0,
        }
    }

    pub fn credit(&mut self, amount: u64) {
        self.total_earnings = self.total_earnings.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn average_is_recomputed_on_every_insert() {
        let mut rep = FreelancerReputation::new("f1".to_string());
        rep.record(4, None, Utc::now());
        rep.record(5, Some("great work".to_string()), Utc::now());
        assert_eq!(rep.average_rating, 4.5);

        rep.record(3, None, Utc::now());
        assert_eq!(rep.average_rating, 4.0);
        assert_eq!(rep.entries.len(), 3);
    }

    #[test]
    fn earnings_accumulate() {
        let mut freelancer = Freelancer::new("f1".to_string(), "Jane".to_string());
        freelancer.credit(100);
        freelancer.credit(50);
        assert_eq!(freelancer.total_earnings, 150);
    }
}
