use std::str::FromStr;

use super::Bike;

/// Which bikes a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BikesFilter {
    #[default]
    All,
    /// Partial bikes (`complete == false`).
    Active,
    Completed,
}

impl BikesFilter {
    pub fn matches(&self, bike: &Bike) -> bool {
        match self {
            BikesFilter::All => true,
            BikesFilter::Active => bike.is_active(),
            BikesFilter::Completed => bike.is_complete(),
        }
    }

    /// Keep the bikes this filter matches, preserving order.
    pub fn apply(&self, bikes: Vec<Bike>) -> Vec<Bike> {
        bikes.into_iter().filter(|b| self.matches(b)).collect()
    }

    /// Get the display label for this filter.
    pub fn label(&self) -> &'static str {
        match self {
            BikesFilter::All => "All Bikes",
            BikesFilter::Active => "Active Bikes",
            BikesFilter::Completed => "Completed Bikes",
        }
    }

    /// Message shown when nothing matches.
    pub fn empty_message(&self) -> &'static str {
        match self {
            BikesFilter::All => "You have no bikes!",
            BikesFilter::Active => "You have no active bikes!",
            BikesFilter::Completed => "You have no completed bikes!",
        }
    }
}

impl FromStr for BikesFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(BikesFilter::All),
            "active" => Ok(BikesFilter::Active),
            "completed" | "complete" => Ok(BikesFilter::Completed),
            other => Err(format!("Unknown filter '{}' (expected all, active or completed)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Bike> {
        vec![
            Bike::with_id("a", Some("BMX".to_string()), None),
            Bike::with_id("b", Some("Road".to_string()), None).with_complete(true),
            Bike::with_id("c", Some("Cruiser".to_string()), None),
        ]
    }

    fn ids(bikes: &[Bike]) -> Vec<&str> {
        bikes.iter().map(|b| b.id()).collect()
    }

    #[test]
    fn test_all_keeps_everything_in_order() {
        assert_eq!(ids(&BikesFilter::All.apply(sample())), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_active_and_completed_partition() {
        let active = BikesFilter::Active.apply(sample());
        let completed = BikesFilter::Completed.apply(sample());
        assert_eq!(ids(&active), vec!["a", "c"]);
        assert_eq!(ids(&completed), vec!["b"]);
        assert_eq!(active.len() + completed.len(), sample().len());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ALL".parse::<BikesFilter>(), Ok(BikesFilter::All));
        assert_eq!("active".parse::<BikesFilter>(), Ok(BikesFilter::Active));
        assert_eq!("complete".parse::<BikesFilter>(), Ok(BikesFilter::Completed));
        assert!("broken".parse::<BikesFilter>().is_err());
    }

    #[test]
    fn test_default_is_all() {
        assert_eq!(BikesFilter::default(), BikesFilter::All);
    }
}
