//! The `Bike` value type.
//!
//! A bike is either complete (a whole, rideable bike) or a partial bike whose
//! `parts` checklist records which parts are present. Bikes are never edited
//! in place; an update is a new `Bike` carrying the same id.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Known bike part categories, in checklist order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BikePart {
    Frame,
    Seat,
    FrontWheel,
    DecentTire,
    Fork,
    Stem,
    Handlebar,
    BrakeLevers,
    GearShifters,
    FrontBrake,
    Pedals,
    CrankArms,
    FrontDerailleur,
    Chain,
    RearBrake,
    RearWheel,
    RearDerailleur,
    DerailleurOrBrakeCable,
}

impl BikePart {
    pub const COUNT: usize = 18;

    pub const ALL: [BikePart; BikePart::COUNT] = [
        BikePart::Frame,
        BikePart::Seat,
        BikePart::FrontWheel,
        BikePart::DecentTire,
        BikePart::Fork,
        BikePart::Stem,
        BikePart::Handlebar,
        BikePart::BrakeLevers,
        BikePart::GearShifters,
        BikePart::FrontBrake,
        BikePart::Pedals,
        BikePart::CrankArms,
        BikePart::FrontDerailleur,
        BikePart::Chain,
        BikePart::RearBrake,
        BikePart::RearWheel,
        BikePart::RearDerailleur,
        BikePart::DerailleurOrBrakeCable,
    ];

    /// Position of this part in a `Parts` checklist.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BikePart::Frame => "Frame",
            BikePart::Seat => "Seat",
            BikePart::FrontWheel => "Front Wheel",
            BikePart::DecentTire => "Decent Tire",
            BikePart::Fork => "Fork",
            BikePart::Stem => "Stem",
            BikePart::Handlebar => "Handlebar",
            BikePart::BrakeLevers => "Brake Levers",
            BikePart::GearShifters => "Gear Shifters",
            BikePart::FrontBrake => "Front Brake",
            BikePart::Pedals => "Pedals",
            BikePart::CrankArms => "Crank Arms",
            BikePart::FrontDerailleur => "Front Derailleur",
            BikePart::Chain => "Chain",
            BikePart::RearBrake => "Rear Brake",
            BikePart::RearWheel => "Rear Wheel",
            BikePart::RearDerailleur => "Rear Derailleur",
            BikePart::DerailleurOrBrakeCable => "Derailleur or Brake Cable",
        }
    }
}

impl fmt::Display for BikePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Presence flags indexed by `BikePart::index`. Unused when the bike is complete.
pub type Parts = [bool; BikePart::COUNT];

/// Immutable bike record.
///
/// Equality and hashing only consider `id`, `bike_type` and `address`; the
/// image, the parts checklist and the completion flag do not take part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bike {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<Vec<u8>>,
    #[serde(rename = "type")]
    bike_type: Option<String>,
    #[serde(default)]
    parts: Parts,
    address: Option<String>,
    #[serde(default)]
    complete: bool,
}

impl Bike {
    /// Create an incomplete bike with a freshly generated id.
    pub fn new(bike_type: Option<String>, address: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), bike_type, address)
    }

    /// Create an incomplete bike that reuses an existing id.
    pub fn with_id(
        id: impl Into<String>,
        bike_type: Option<String>,
        address: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            image: None,
            bike_type,
            parts: [false; BikePart::COUNT],
            address,
            complete: false,
        }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_parts(mut self, parts: Parts) -> Self {
        self.parts = parts;
        self
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// A copy of this bike marked complete.
    pub fn completed(&self) -> Self {
        self.clone().with_complete(true)
    }

    /// A copy of this bike marked incomplete.
    pub fn activated(&self) -> Self {
        self.clone().with_complete(false)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    pub fn bike_type(&self) -> Option<&str> {
        self.bike_type.as_deref()
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_active(&self) -> bool {
        !self.complete
    }

    /// True when neither a type nor an address was given.
    pub fn is_empty(&self) -> bool {
        is_blank(self.bike_type()) && is_blank(self.address())
    }

    /// The label shown in lists: the type, or the address when no type is set.
    pub fn title_for_list(&self) -> Option<&str> {
        if is_blank(self.bike_type()) {
            self.address()
        } else {
            self.bike_type()
        }
    }

    /// Parts marked present. Empty for complete bikes.
    pub fn present_parts(&self) -> Vec<BikePart> {
        self.parts_matching(true)
    }

    /// Parts still missing. Empty for complete bikes.
    pub fn missing_parts(&self) -> Vec<BikePart> {
        self.parts_matching(false)
    }

    fn parts_matching(&self, present: bool) -> Vec<BikePart> {
        if self.complete {
            return Vec::new();
        }
        BikePart::ALL
            .iter()
            .filter(|part| self.parts[part.index()] == present)
            .copied()
            .collect()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|s| s.trim().is_empty()).unwrap_or(true)
}

impl PartialEq for Bike {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.bike_type == other.bike_type && self.address == other.address
    }
}

impl Eq for Bike {}

impl Hash for Bike {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.bike_type.hash(state);
        self.address.hash(state);
    }
}

impl fmt::Display for Bike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bike type {}", self.bike_type().unwrap_or("(none)"))
    }
}
