//! Per-entity-kind state codecs
//!
//! The simulation owns concrete entity types; snapshots only carry
//! [`EntityState`]. A `StateCodec` converts between the two for one kind.

use crate::EntityState;
use tracing::debug;

/// Converts one kind of simulation entity to and from snapshot state
pub trait StateCodec {
    /// The simulation-side entity type
    type Entity;

    /// The kind tag written into every `EntityState`
    fn kind(&self) -> &str;

    /// Describe an entity for a snapshot
    fn serialize(&self, entity: &Self::Entity) -> EntityState;

    /// Rebuild an entity from snapshot state
    ///
    /// Returns `None` for malformed state.
    fn from_state(&self, state: &EntityState) -> Option<Self::Entity>;
}

/// Serialize a batch of entities
pub fn encode_entities<'a, C>(
    codec: &C,
    entities: impl IntoIterator<Item = &'a C::Entity>,
) -> Vec<EntityState>
where
    C: StateCodec,
    C::Entity: 'a,
{
    entities
        .into_iter()
        .map(|entity| codec.serialize(entity))
        .collect()
}

/// Rebuild every entity of the codec's kind, skipping malformed entries
pub fn decode_entities<C: StateCodec>(codec: &C, states: &[EntityState]) -> Vec<C::Entity> {
    states
        .iter()
        .filter(|state| state.kind == codec.kind())
        .filter_map(|state| {
            let entity = codec.from_state(state);
            if entity.is_none() {
                debug!(kind = %state.kind, "dropping malformed entity state");
            }
            entity
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Projectile {
        x: f64,
        y: f64,
    }

    struct ProjectileCodec;

    impl StateCodec for ProjectileCodec {
        type Entity = Projectile;

        fn kind(&self) -> &str {
            "projectile"
        }

        fn serialize(&self, entity: &Projectile) -> EntityState {
            EntityState::new("projectile")
                .with("x", entity.x)
                .with("y", entity.y)
        }

        fn from_state(&self, state: &EntityState) -> Option<Projectile> {
            Some(Projectile {
                x: state.get_number("x")?,
                y: state.get_number("y")?,
            })
        }
    }

    #[test]
    fn test_decode_skips_other_kinds_and_malformed() {
        let codec = ProjectileCodec;
        let mut states = encode_entities(&codec, &[Projectile { x: 1.0, y: 2.0 }]);
        states.push(EntityState::new("zone").with("radius", 4.0f64));
        states.push(EntityState::new("projectile").with("x", 5.0f64));

        let decoded = decode_entities(&codec, &states);
        assert_eq!(decoded, vec![Projectile { x: 1.0, y: 2.0 }]);
    }
}
