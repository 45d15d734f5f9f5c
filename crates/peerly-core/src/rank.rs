//! Candidate ordering

use std::sync::Arc;

use crate::tutor::Tutor;

/// Order search candidates for display.
///
/// Without recommendation the incoming order is kept untouched. With it,
/// candidates are sorted by rating, highest first, counting a missing rating
/// as zero. The sort is stable so equal ratings keep their incoming order and
/// repeated calls never reshuffle them.
pub fn rank(mut candidates: Vec<Arc<Tutor>>, use_recommendation: bool) -> Vec<Arc<Tutor>> {
    if use_recommendation {
        candidates.sort_by(|a, b| score(b).total_cmp(&score(a)));
    }
    candidates
}

fn score(tutor: &Tutor) -> f64 {
    tutor.rating.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::TutorId;

    fn tutor(id: &str, rating: Option<f64>) -> Arc<Tutor> {
        Arc::new(Tutor {
            id: TutorId::new(id),
            name: id.to_string(),
            staff_id: id.to_string(),
            subjects: vec![],
            accepting_students: true,
            max_students: 0,
            current_students: 0,
            rating,
            slots: vec![],
        })
    }

    fn ids(tutors: &[Arc<Tutor>]) -> Vec<&str> {
        tutors.iter().map(|t| t.id.as_str()).collect()
    }

    fn candidates() -> Vec<Arc<Tutor>> {
        vec![
            tutor("a", Some(3.5)),
            tutor("b", None),
            tutor("c", Some(4.8)),
            tutor("d", Some(3.5)),
            tutor("e", Some(0.0)),
            tutor("f", None),
        ]
    }

    #[test]
    fn test_without_recommendation_keeps_order() {
        let first = rank(candidates(), false);
        let second = rank(candidates(), false);
        assert_eq!(ids(&first), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_recommendation_sorts_by_rating_stably() {
        let ranked = rank(candidates(), true);
        // missing ratings tie with 0.0 and keep their incoming order
        assert_eq!(ids(&ranked), vec!["c", "a", "d", "b", "e", "f"]);

        let scores: Vec<f64> = ranked.iter().map(|t| score(t)).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        let again = rank(ranked.clone(), true);
        assert_eq!(ids(&again), ids(&ranked));
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new(), true).is_empty());
    }
}
