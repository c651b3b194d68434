//! Origin selection

use crate::config::FromOrigin;
use promo_freight::FreightOrigin;

/// Origin an entry is pinned to, if any
///
/// `None` means every allowed origin is eligible.
#[must_use]
pub fn desired_origin(from_origin: Option<&FromOrigin>) -> Option<FreightOrigin> {
    from_origin.map(|o| FreightOrigin::new(o.kind.clone(), o.name.clone()))
}

/// Origins to search for one entry, in search order
#[must_use]
pub fn eligible_origins(
    from_origin: Option<&FromOrigin>,
    allowed: &[FreightOrigin],
) -> Vec<FreightOrigin> {
    match desired_origin(from_origin) {
        Some(origin) => vec![origin],
        None => allowed.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_override_means_unrestricted() {
        assert_eq!(desired_origin(None), None);

        let allowed = vec![FreightOrigin::warehouse("a"), FreightOrigin::warehouse("b")];
        assert_eq!(eligible_origins(None, &allowed), allowed);
    }

    #[test]
    fn override_is_returned_unchanged() {
        let pinned = FromOrigin {
            kind: "Warehouse".to_string(),
            name: "pinned".to_string(),
        };
        assert_eq!(
            desired_origin(Some(&pinned)),
            Some(FreightOrigin::warehouse("pinned"))
        );
        assert_eq!(
            eligible_origins(Some(&pinned), &[FreightOrigin::warehouse("a")]),
            vec![FreightOrigin::warehouse("pinned")]
        );
    }
}
