use crate::engine::random::RandomSource;

pub const TRACKING_PREFIX: &str = "SHP";
pub const TRACKING_SUFFIX_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_tracking_number(random: &dyn RandomSource) -> String {
    let mut number = String::with_capacity(TRACKING_PREFIX.len() + TRACKING_SUFFIX_LEN);
    number.push_str(TRACKING_PREFIX);
    for _ in 0..TRACKING_SUFFIX_LEN {
        number.push(ALPHABET[random.index(ALPHABET.len())] as char);
    }
    number
}

pub fn is_tracking_number(candidate: &str) -> bool {
    candidate.len() == TRACKING_PREFIX.len() + TRACKING_SUFFIX_LEN
        && candidate.starts_with(TRACKING_PREFIX)
        && candidate[TRACKING_PREFIX.len()..]
            .bytes()
            .all(|b| ALPHABET.contains(&b))
}
