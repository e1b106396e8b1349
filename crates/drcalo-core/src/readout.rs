//! Sensitive volume registry and the cell resolution seam
//!
//! A [`Detector`] bundles the sensitive volumes that produce hits with the
//! [`CellResolver`] that turns a touch point into a cell key and center.
//! Resolution is supplied from outside: the core only requires it to be
//! deterministic for a given touch point.

use crate::cell_id::CellIdLayout;
use crate::frame::{contributions_name, EVENT_HEADER, MC_PARTICLES};
use crate::{CellId, Error, Result, TouchPoint, Vec3, VolumeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The finite set of hit kinds a volume can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadoutKind {
    /// Energy plus Cerenkov/scintillation production counting
    DualReadout,
    /// Energy only
    Calorimeter,
}

impl ReadoutKind {
    /// Whether optical photon production is counted for this kind
    pub fn counts_photons(&self) -> bool {
        matches!(self, ReadoutKind::DualReadout)
    }

    /// Zero-energy policy used when a volume does not override it
    pub fn default_zero_energy(&self) -> ZeroEnergyPolicy {
        match self {
            ReadoutKind::DualReadout => ZeroEnergyPolicy::Keep,
            ReadoutKind::Calorimeter => ZeroEnergyPolicy::Skip,
        }
    }
}

/// Handling of steps that deposit no energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZeroEnergyPolicy {
    /// Every step touches its cell and leaves a contribution
    Keep,
    /// Zero-deposit steps leave no contribution; they only touch a cell
    /// when they feed a photon channel
    Skip,
}

/// A sensitive volume and how its steps are aggregated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveVolume {
    /// Volume name, also the output collection name
    pub name: VolumeId,
    /// Kind of hits produced
    pub kind: ReadoutKind,
    /// Zero-energy step handling
    pub zero_energy: ZeroEnergyPolicy,
    /// Cell key encoding string written to the metadata frame
    pub encoding: String,
}

impl SensitiveVolume {
    /// Create a volume with the kind's default policy and the standard cell layout
    pub fn new(name: impl Into<VolumeId>, kind: ReadoutKind) -> Self {
        Self {
            name: name.into(),
            kind,
            zero_energy: kind.default_zero_energy(),
            encoding: CellIdLayout::default().encoding_string(),
        }
    }

    /// Dual-readout volume
    pub fn dual_readout(name: impl Into<VolumeId>) -> Self {
        Self::new(name, ReadoutKind::DualReadout)
    }

    /// Plain calorimeter volume
    pub fn calorimeter(name: impl Into<VolumeId>) -> Self {
        Self::new(name, ReadoutKind::Calorimeter)
    }

    /// Override the zero-energy policy
    pub fn with_zero_energy(mut self, policy: ZeroEnergyPolicy) -> Self {
        self.zero_energy = policy;
        self
    }

    /// Override the cell key encoding string
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }
}

/// Cell key and nominal center returned by a resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCell {
    pub cell_id: CellId,
    /// Cell center in internal length units
    pub center: Vec3,
}

impl ResolvedCell {
    pub fn new(cell_id: CellId, center: Vec3) -> Self {
        Self { cell_id, center }
    }
}

/// Maps a touch point in a volume to its cell
///
/// Must be deterministic and idempotent. An error means no cell can be
/// attributed and is fatal for the event.
pub trait CellResolver: Send + Sync {
    fn resolve(&self, volume: &VolumeId, touch: &TouchPoint) -> Result<ResolvedCell>;
}

impl<F> CellResolver for F
where
    F: Fn(&VolumeId, &TouchPoint) -> Result<ResolvedCell> + Send + Sync,
{
    fn resolve(&self, volume: &VolumeId, touch: &TouchPoint) -> Result<ResolvedCell> {
        self(volume, touch)
    }
}

/// Registered sensitive volumes plus the cell resolver
pub struct Detector {
    name: String,
    volumes: IndexMap<VolumeId, SensitiveVolume>,
    resolver: Box<dyn CellResolver>,
}

impl Detector {
    /// Create a detector with no volumes
    pub fn new(name: impl Into<String>, resolver: impl CellResolver + 'static) -> Self {
        Self {
            name: name.into(),
            volumes: IndexMap::new(),
            resolver: Box::new(resolver),
        }
    }

    /// Register a sensitive volume, replacing any volume of the same name
    ///
    /// The volume's encoding must parse as a cell key layout, and neither of
    /// its two output collections may share a name with the event header,
    /// the particle collection or another volume's collections.
    pub fn add_volume(&mut self, volume: SensitiveVolume) -> Result<()> {
        CellIdLayout::parse(&volume.encoding)?;

        let name = volume.name.as_str();
        if name == EVENT_HEADER || name == MC_PARTICLES {
            return Err(Error::CollectionNameTaken(name.to_string()));
        }
        let own_contributions = contributions_name(name);
        for other in self.volumes.keys().filter(|other| **other != volume.name) {
            if other.as_str() == own_contributions {
                return Err(Error::CollectionNameTaken(own_contributions));
            }
            if contributions_name(other.as_str()) == name {
                return Err(Error::CollectionNameTaken(name.to_string()));
            }
        }

        self.volumes.insert(volume.name.clone(), volume);
        Ok(())
    }

    /// Builder form of [`add_volume`](Self::add_volume)
    pub fn with_volume(mut self, volume: SensitiveVolume) -> Result<Self> {
        self.add_volume(volume)?;
        Ok(self)
    }

    /// Detector name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a volume
    pub fn volume(&self, name: &VolumeId) -> Option<&SensitiveVolume> {
        self.volumes.get(name)
    }

    /// Volumes in registration order
    pub fn volumes(&self) -> impl Iterator<Item = &SensitiveVolume> {
        self.volumes.values()
    }

    /// Number of registered volumes
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    /// The cell resolver
    pub fn resolver(&self) -> &dyn CellResolver {
        self.resolver.as_ref()
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("name", &self.name)
            .field("volumes", &self.volumes.keys().collect::<Vec<_>>())
            .finish()
    }
}
