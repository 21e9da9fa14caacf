//! Per-document question quota.

/// Result of a quota check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { message: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Pure limit check on the number of prior human turns of one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub free_limit: usize,
    pub pro_limit: usize,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_limit: 4,
            pro_limit: 20,
        }
    }
}

impl QuotaPolicy {
    pub fn new(free_limit: usize, pro_limit: usize) -> Self {
        Self {
            free_limit,
            pro_limit,
        }
    }

    pub fn allow(&self, is_pro: bool, prior_human_messages: usize) -> Decision {
        if is_pro {
            if prior_human_messages < self.pro_limit {
                Decision::Allow
            } else {
                Decision::Deny {
                    message: format!(
                        "You've reached the PRO limit of the {} question per document!",
                        self.pro_limit
                    ),
                }
            }
        } else if prior_human_messages < self.free_limit {
            Decision::Allow
        } else {
            Decision::Deny {
                message: format!(
                    "You'll need to upgrade to PRO to ask more than {} questions!",
                    self.free_limit
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_stops_at_four() {
        let q = QuotaPolicy::default();
        assert!(q.allow(false, 3).is_allowed());
        assert_eq!(
            q.allow(false, 4),
            Decision::Deny {
                message: "You'll need to upgrade to PRO to ask more than 4 questions!".into()
            }
        );
    }

    #[test]
    fn pro_tier_stops_at_twenty() {
        let q = QuotaPolicy::default();
        assert!(q.allow(true, 4).is_allowed());
        assert!(q.allow(true, 19).is_allowed());
        assert_eq!(
            q.allow(true, 20),
            Decision::Deny {
                message: "You've reached the PRO limit of the 20 question per document!".into()
            }
        );
    }

    #[test]
    fn limits_come_from_config() {
        let q = QuotaPolicy::new(1, 2);
        assert!(!q.allow(false, 1).is_allowed());
        assert!(q.allow(true, 1).is_allowed());
    }
}
