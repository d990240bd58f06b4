//! Reaction catalog entries.

use serde::{Deserialize, Serialize};
use synthlab_core::error::DomainError;
use uuid::Uuid;

/// Physical description of one side of a reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    /// Material name.
    pub name: String,
    /// Density in g/cm³.
    pub density: f64,
    /// Molar mass in g/mol.
    pub molar_mass: f64,
}

impl MaterialDescriptor {
    fn validate(&self, side: &str) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "{side} material name is required"
            )));
        }
        require_positive(self.density, side, "density")?;
        require_positive(self.molar_mass, side, "molar mass")
    }
}

fn require_positive(value: f64, side: &str, field: &str) -> Result<(), DomainError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DomainError::OutOfRange(format!(
            "{side} material {field} must be a positive number, got {value}"
        )))
    }
}

/// Input for a new catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReaction {
    /// Short title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub details: String,
    /// What the reaction consumes.
    pub starting_material: MaterialDescriptor,
    /// What the reaction produces.
    pub result_material: MaterialDescriptor,
}

/// Partial update of a catalog entry. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub details: Option<String>,
    /// New starting material name.
    pub starting_material_name: Option<String>,
    /// New starting material density.
    pub starting_material_density: Option<f64>,
    /// New starting material molar mass.
    pub starting_material_molar_mass: Option<f64>,
    /// New result material name.
    pub result_material_name: Option<String>,
    /// New result material density.
    pub result_material_density: Option<f64>,
    /// New result material molar mass.
    pub result_material_molar_mass: Option<f64>,
}

impl ReactionPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.details.is_none()
            && self.starting_material_name.is_none()
            && self.starting_material_density.is_none()
            && self.starting_material_molar_mass.is_none()
            && self.result_material_name.is_none()
            && self.result_material_density.is_none()
            && self.result_material_molar_mass.is_none()
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reaction {
    /// Unique identifier.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub details: String,
    /// What the reaction consumes.
    pub starting_material: MaterialDescriptor,
    /// What the reaction produces.
    pub result_material: MaterialDescriptor,
    /// Reference to the reaction's image in object storage, if any.
    pub image_ref: Option<String>,
    /// Soft-delete marker. Deleted reactions are hidden from lookups but
    /// remain readable for historical orders.
    pub is_deleted: bool,
}

impl Reaction {
    /// Creates a catalog entry after validating its constants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank title or material name and
    /// `DomainError::OutOfRange` for a non-positive or non-finite constant.
    pub fn create(id: Uuid, input: NewReaction) -> Result<Self, DomainError> {
        let reaction = Self {
            id,
            title: input.title.trim().to_owned(),
            details: input.details,
            starting_material: input.starting_material,
            result_material: input.result_material,
            image_ref: None,
            is_deleted: false,
        };
        reaction.validate()?;
        Ok(reaction)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.title.is_empty() {
            return Err(DomainError::Validation("title is required".to_owned()));
        }
        self.starting_material.validate("starting")?;
        self.result_material.validate("result")
    }

    /// Applies `patch`. Either every field is applied or, on error, none is.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty patch, and the errors of
    /// [`Reaction::create`] if the patched entry would be invalid.
    pub fn apply_patch(&mut self, patch: &ReactionPatch) -> Result<(), DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Validation("no fields to update".to_owned()));
        }

        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = title.trim().to_owned();
        }
        if let Some(details) = &patch.details {
            next.details.clone_from(details);
        }
        if let Some(name) = &patch.starting_material_name {
            next.starting_material.name.clone_from(name);
        }
        if let Some(density) = patch.starting_material_density {
            next.starting_material.density = density;
        }
        if let Some(molar_mass) = patch.starting_material_molar_mass {
            next.starting_material.molar_mass = molar_mass;
        }
        if let Some(name) = &patch.result_material_name {
            next.result_material.name.clone_from(name);
        }
        if let Some(density) = patch.result_material_density {
            next.result_material.density = density;
        }
        if let Some(molar_mass) = patch.result_material_molar_mass {
            next.result_material.molar_mass = molar_mass;
        }
        next.validate()?;

        *self = next;
        Ok(())
    }

    /// Marks the entry deleted, detaching and returning its image reference.
    pub fn mark_deleted(&mut self) -> Option<String> {
        self.is_deleted = true;
        self.image_ref.take()
    }

    /// Clears the soft-delete marker.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    /// Points the entry at a new image, returning the one it replaces.
    pub fn replace_image(&mut self, reference: String) -> Option<String> {
        self.image_ref.replace(reference)
    }
}
