//! Format validation used to adjust detection confidence

/// Luhn check over the ASCII digits of a value (separators ignored)
pub fn luhn_valid(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 12 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// SSN area/group/serial rules: area not 000, 666 or 9xx; group not 00;
/// serial not 0000.
pub fn ssn_valid(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 9 {
        return false;
    }

    let (area, rest) = digits.split_at(3);
    let (group, serial) = rest.split_at(2);

    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

/// AWS access key id: known prefix followed by 16 uppercase alphanumerics
pub fn aws_key_valid(key: &str) -> bool {
    if key.len() != 20 {
        return false;
    }
    const PREFIXES: [&str; 4] = ["AKIA", "ABIA", "ACCA", "ASIA"];
    PREFIXES.iter().any(|p| key.starts_with(p))
        && key[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Local part of an email address is well formed (no leading, trailing or
/// doubled dots)
pub fn email_well_formed(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !domain.contains("..")
        && !domain.starts_with('-')
}
