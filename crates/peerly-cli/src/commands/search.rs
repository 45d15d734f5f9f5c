use anyhow::Result;
use peerly_core::FilterCriteria;
use peerly_storage::load_directory;

use crate::cli::SearchArgs;

pub async fn handle(args: SearchArgs) -> Result<()> {
    let directory = load_directory(&args.feed).await?;
    let criteria = criteria(args);

    let matches = peerly_core::search(&directory, &criteria);
    let ranked = peerly_core::rank(matches, criteria.use_recommendation);

    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

fn criteria(args: SearchArgs) -> FilterCriteria {
    FilterCriteria {
        subject_code: args.subject,
        campuses: args.campuses.into_iter().collect(),
        weekdays: args.weekdays.into_iter().collect(),
        time_bands: args.time_bands,
        modes: args.modes.into_iter().collect(),
        rating_buckets: args.rating_buckets.into_iter().collect(),
        query: args.query,
        use_recommendation: args.recommend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use peerly_core::{DeliveryMode, TimeBand, Weekday};

    fn parse(argv: &[&str]) -> SearchArgs {
        match Cli::parse_from(argv).command {
            Commands::Search(args) => args,
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_flags_become_criteria() {
        let args = parse(&[
            "peerly", "search", "tutors.json", "--subject", "MT2013", "--weekday", "fri", "--weekday",
            "Monday", "--mode", "offline", "--band", "morning", "--rating", "4", "--recommend",
        ]);
        let criteria = criteria(args);

        assert_eq!(criteria.subject(), Some("MT2013"));
        assert_eq!(criteria.weekdays.len(), 2);
        assert!(criteria.weekdays.contains(&Weekday::Friday));
        assert!(criteria.modes.contains(&DeliveryMode::Offline));
        assert_eq!(criteria.time_bands, vec![TimeBand::morning()]);
        assert!(criteria.rating_buckets.contains(&4));
        assert!(criteria.use_recommendation);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Cli::try_parse_from(["peerly", "search", "f.json", "--weekday", "someday"]).is_err());
        assert!(Cli::try_parse_from(["peerly", "search", "f.json", "--rating", "9"]).is_err());
        assert!(Cli::try_parse_from(["peerly", "search", "f.json", "--band", "16:00-09:00"]).is_err());
    }
}
