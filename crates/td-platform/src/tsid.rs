//! TSID Generation
//!
//! Time-sorted unique ids encoded as 13-character Crockford Base32 strings.
//! Lexicographic order matches creation order, which keeps ids readable in
//! logs and sortable in the database without a separate timestamp key.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Crockford Base32 alphabet (no I, L, O, U). Ascending ASCII order, so
/// encoded strings compare the same way as the underlying integers.
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Custom epoch: 2020-01-01T00:00:00Z, leaves 42 bits of millis until ~2159.
const TSID_EPOCH_MS: u64 = 1_577_836_800_000;

const COUNTER_BITS: u32 = 22;
const COUNTER_MASK: u64 = (1 << COUNTER_BITS) - 1;

static COUNTER: OnceLock<AtomicU64> = OnceLock::new();

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID: 42 bits of milliseconds since the custom epoch
    /// followed by a 22-bit randomly seeded per-process counter.
    pub fn generate() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
            .saturating_sub(TSID_EPOCH_MS);

        let counter = COUNTER
            .get_or_init(|| AtomicU64::new(rand::thread_rng().gen::<u64>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let value = (millis << COUNTER_BITS) | counter;
        Self::encode(value)
    }

    /// Check whether a string has the shape of a generated id. Lookups use
    /// this to treat malformed ids as "not found" instead of querying.
    pub fn is_valid(id: &str) -> bool {
        id.len() == 13 && id.bytes().all(|b| ALPHABET.contains(&b))
    }

    fn encode(value: u64) -> String {
        // 13 chars * 5 bits = 65 bits; the top character carries only the
        // high 4 bits of a 64-bit value.
        let mut out = [0u8; 13];
        for (i, slot) in out.iter_mut().enumerate() {
            let shift = 5 * (12 - i) as u32;
            let index = (value >> shift) & 0x1F;
            *slot = ALPHABET[index as usize];
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tsid_format() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(id.chars().all(|c| {
            matches!(c, '0'..='9' | 'A'..='H' | 'J'..='K' | 'M'..='N' | 'P'..='T' | 'V'..='Z')
        }));
    }

    #[test]
    fn test_tsid_uniqueness() {
        let ids: HashSet<String> = (0..1000).map(|_| TsidGenerator::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_tsid_sortability() {
        let id1 = TsidGenerator::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TsidGenerator::generate();
        assert!(id2 > id1, "id2 ({}) should be greater than id1 ({})", id2, id1);
    }

    #[test]
    fn test_is_valid() {
        let id = TsidGenerator::generate();
        assert!(TsidGenerator::is_valid(&id));

        assert!(!TsidGenerator::is_valid(""));
        assert!(!TsidGenerator::is_valid("too-short"));
        assert!(!TsidGenerator::is_valid("0123456789ABL"));
        assert!(!TsidGenerator::is_valid("lowercase0000"));
        assert!(!TsidGenerator::is_valid("507f1f77bcf86cd799439011"));
    }
}
