use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use membership_core::{AdherentId, DomainError, DomainResult, Entity};

use crate::adhesion::{Adhesion, AdhesionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// Postal and contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coordonnees {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Coordonnees {
    /// Both address lines joined with a space, skipping empty ones.
    pub fn full_address(&self) -> Option<String> {
        let parts: Vec<&str> = [self.address1.as_deref(), self.address2.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Editable fields of a member (everything except identity and adhesions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherentInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub volunteer: bool,
    #[serde(default)]
    pub volunteer_note: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub other_note: Option<String>,
    #[serde(default)]
    pub contact: Option<Coordonnees>,
}

/// A member of the association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adherent {
    id: AdherentId,
    first_name: String,
    last_name: String,
    volunteer: bool,
    volunteer_note: Option<String>,
    gender: Option<Gender>,
    other_note: Option<String>,
    contact: Option<Coordonnees>,
    /// Sorted by date, oldest first.
    adhesions: Vec<Adhesion>,
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

impl Adherent {
    pub fn create(id: AdherentId, input: AdherentInput) -> DomainResult<Self> {
        let mut adherent = Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            volunteer: false,
            volunteer_note: None,
            gender: None,
            other_note: None,
            contact: None,
            adhesions: Vec::new(),
        };
        adherent.update(input)?;
        Ok(adherent)
    }

    /// Replace the editable fields. Adhesions are untouched.
    pub fn update(&mut self, input: AdherentInput) -> DomainResult<()> {
        self.first_name = required("first name", &input.first_name)?;
        self.last_name = required("last name", &input.last_name)?;
        self.volunteer = input.volunteer;
        self.volunteer_note = input.volunteer_note;
        self.gender = input.gender;
        self.other_note = input.other_note;
        self.contact = input.contact;
        Ok(())
    }

    pub fn id_typed(&self) -> AdherentId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_volunteer(&self) -> bool {
        self.volunteer
    }

    pub fn volunteer_note(&self) -> Option<&str> {
        self.volunteer_note.as_deref()
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn other_note(&self) -> Option<&str> {
        self.other_note.as_deref()
    }

    pub fn contact(&self) -> Option<&Coordonnees> {
        self.contact.as_ref()
    }

    pub fn adhesions(&self) -> &[Adhesion] {
        &self.adhesions
    }

    pub fn latest_adhesion(&self) -> Option<&Adhesion> {
        self.adhesions.last()
    }

    pub fn add_adhesion(&mut self, adhesion: Adhesion) {
        let at = self.adhesions.partition_point(|a| a.date <= adhesion.date);
        self.adhesions.insert(at, adhesion);
    }

    pub fn status(&self, today: NaiveDate) -> AdhesionStatus {
        AdhesionStatus::of(self.latest_adhesion(), today)
    }

    /// Case-insensitive match on first or last name. Blank criteria match everyone.
    pub fn matches(&self, criteria: &str) -> bool {
        let needle = criteria.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.first_name.to_lowercase().contains(&needle)
            || self.last_name.to_lowercase().contains(&needle)
            || self.full_name().to_lowercase().contains(&needle)
    }

    /// Ordering used for listings: last name, then first name.
    pub fn sort_key(&self) -> (String, String) {
        (self.last_name.to_lowercase(), self.first_name.to_lowercase())
    }
}

impl Entity for Adherent {
    type Id = AdherentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
