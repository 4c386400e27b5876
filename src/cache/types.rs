/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierStatus {
    HitL1,
    HitL2,
    Miss,
}

impl TierStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            TierStatus::HitL1 => "HIT_L1",
            TierStatus::HitL2 => "HIT_L2",
            TierStatus::Miss => "MISS",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, TierStatus::Miss)
    }
}

impl std::fmt::Display for TierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a [`crate::TwoTierCache::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TieredLookupResult<V> {
    HitL1(V),
    HitL2(V),
    Miss,
}

impl<V> TieredLookupResult<V> {
    pub fn status(&self) -> TierStatus {
        match self {
            TieredLookupResult::HitL1(_) => TierStatus::HitL1,
            TieredLookupResult::HitL2(_) => TierStatus::HitL2,
            TieredLookupResult::Miss => TierStatus::Miss,
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, TieredLookupResult::Miss)
    }

    pub fn is_l1_hit(&self) -> bool {
        matches!(self, TieredLookupResult::HitL1(_))
    }

    pub fn is_l2_hit(&self) -> bool {
        matches!(self, TieredLookupResult::HitL2(_))
    }

    /// Drops the tier information.
    pub fn into_value(self) -> Option<V> {
        match self {
            TieredLookupResult::HitL1(v) | TieredLookupResult::HitL2(v) => Some(v),
            TieredLookupResult::Miss => None,
        }
    }
}
