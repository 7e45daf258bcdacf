use rand::Rng;
use uuid::Uuid;

use crate::TechnicianId;

/// Generate a deterministic v4-format UUID from a seeded RNG.
pub fn generate_uuid(rng: &mut impl Rng) -> Uuid {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Mint an id for a technician loaded without one.
pub fn generate_technician_id(rng: &mut impl Rng) -> TechnicianId {
    TechnicianId(generate_uuid(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn same_seed_mints_same_technician_ids() {
        let mut rng1 = ChaCha8Rng::seed_from_u64(7);
        let mut rng2 = ChaCha8Rng::seed_from_u64(7);
        let first: Vec<_> = (0..3).map(|_| generate_technician_id(&mut rng1)).collect();
        let second: Vec<_> = (0..3).map(|_| generate_technician_id(&mut rng2)).collect();
        assert_eq!(first, second);
        assert_eq!(first[0].0.get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn consecutive_ids_differ() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_ne!(generate_technician_id(&mut rng), generate_technician_id(&mut rng));
    }
}
