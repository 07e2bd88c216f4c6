use snmp2::Oid;

use crate::error::ConfigError;

/// Разбирает OID в точечной нотации, ведущая точка допускается
pub fn parse_oid(s: &str) -> Result<Oid<'static>, ConfigError> {
    let invalid = || ConfigError::InvalidOid(s.to_string());

    let parts: Vec<u64> = s
        .trim()
        .trim_start_matches('.')
        .split('.')
        .map(|p| p.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;

    // первые две дуги: 0..=2 и не больше 39 для 0/1 (X.690)
    if parts.len() < 2 || parts[0] > 2 || (parts[0] < 2 && parts[1] > 39) {
        return Err(invalid());
    }

    Oid::from(&parts).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_leading_dot() {
        let oid = parse_oid(".1.3.6.1.4.1.318.1.1.1.2.2.1.0").unwrap();
        assert_eq!(oid.to_string(), "1.3.6.1.4.1.318.1.1.1.2.2.1.0");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_oid("").is_err());
        assert!(parse_oid("1").is_err());
        assert!(parse_oid("1.3..6").is_err());
        assert!(parse_oid("1.3.six").is_err());
        assert!(matches!(parse_oid("7.1"), Err(ConfigError::InvalidOid(s)) if s == "7.1"));
    }
}
