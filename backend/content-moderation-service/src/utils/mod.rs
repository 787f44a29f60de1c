use chrono::{Datelike, NaiveDate};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `input`
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Short, non-reversible token for a client IP address
pub fn hash_ip(ip: &str) -> String {
    let mut digest = sha256_hex(ip);
    digest.truncate(16);
    digest
}

/// Whole years between `birth_date` and `today`; negative when born after `today`
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_ip_is_truncated() {
        let hashed = hash_ip("203.0.113.7");
        assert_eq!(hashed.len(), 16);
        assert_eq!(hashed, hash_ip("203.0.113.7"));
        assert_ne!(hashed, hash_ip("203.0.113.8"));
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        let day_before = NaiveDate::from_ymd_opt(2018, 6, 14).unwrap();
        let birthday = NaiveDate::from_ymd_opt(2018, 6, 15).unwrap();

        assert_eq!(age_on(birth, day_before), 17);
        assert_eq!(age_on(birth, birthday), 18);
    }

    #[test]
    fn test_age_for_future_birth_date() {
        let birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(age_on(birth, today), -4);
    }
}
