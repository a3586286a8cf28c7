use harvestor_core::{
    HarvestorError, HarvestorResult, OperationRequirement, Target, INSTABILITY_PER_AMPLIFY,
    INSTABILITY_PER_EXTRACT, STABILITY_PER_FORTIFY,
};

/// Collaborator interface for the yield-growth formula: how many Amplify
/// units restore the target's yield by the given multiplier.
///
/// Implementations must be monotone non-decreasing in `growth` so the
/// requirement stays monotone in the extract dial.
pub trait GrowthModel: Send + Sync {
    /// Amplify units needed to multiply the target's yield by `growth`.
    /// May be fractional; the calculator rounds up.
    fn amplify_units(&self, target: &Target, growth: f64) -> f64;
}

/// Compound-rate growth model: each Amplify unit multiplies yield by
/// `1 + rate_per_unit`, so restoring a multiplier `g` takes
/// `ln(g * headroom) / ln(1 + rate_per_unit)` units.
///
/// The headroom factor over-provisions growth to absorb drift between
/// planning and completion; 1.1 restores 10% more than the drain estimate.
#[derive(Debug, Clone, Copy)]
pub struct CompoundGrowth {
    /// Yield multiplier contributed by a single Amplify unit, minus one.
    pub rate_per_unit: f64,
    /// Over-provisioning factor applied to the needed multiplier.
    pub headroom: f64,
}

impl CompoundGrowth {
    /// Model with the given per-unit rate and the default 1.1 headroom.
    pub fn new(rate_per_unit: f64) -> Self {
        Self {
            rate_per_unit,
            headroom: 1.1,
        }
    }

    /// Overrides the headroom factor.
    pub fn with_headroom(mut self, headroom: f64) -> Self {
        self.headroom = headroom;
        self
    }
}

impl Default for CompoundGrowth {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl GrowthModel for CompoundGrowth {
    fn amplify_units(&self, _target: &Target, growth: f64) -> f64 {
        let needed = growth * self.headroom;
        if needed <= 1.0 {
            return 0.0;
        }
        needed.ln() / (1.0 + self.rate_per_unit).ln()
    }
}

/// Converts the operator's extract dial into the four-count requirement one
/// batch must satisfy to leave the target's instability where it started.
///
/// Counts always round up. Rounding down would under-provision Fortify and
/// let instability drift upward across cycles.
///
/// # Errors
///
/// [`HarvestorError::Domain`] when `extract * extract_fraction >= 1`: the
/// growth multiplier is undefined because the dial would drain the target
/// below zero. The caller must shrink the dial; the calculator never clamps.
pub fn requirement_for(
    target: &Target,
    extract: u64,
    model: &dyn GrowthModel,
) -> HarvestorResult<OperationRequirement> {
    if extract == 0 {
        return Ok(OperationRequirement {
            extract: 0,
            fortify_for_extract: 0,
            amplify: 0,
            fortify_for_amplify: 0,
        });
    }

    let fortify_for_extract = fortify_units_for(extract, INSTABILITY_PER_EXTRACT);

    let drained = extract as f64 * target.extract_fraction;
    if drained >= 1.0 {
        return Err(HarvestorError::Domain {
            requested: extract,
            fraction: target.extract_fraction,
        });
    }
    let growth_needed = 1.0 / (1.0 - drained);

    let amplify = model.amplify_units(target, growth_needed).max(0.0).ceil() as u64;
    let fortify_for_amplify = fortify_units_for(amplify, INSTABILITY_PER_AMPLIFY);

    Ok(OperationRequirement {
        extract,
        fortify_for_extract,
        amplify,
        fortify_for_amplify,
    })
}

/// Fortify units cancelling the instability `units` operations add.
fn fortify_units_for(units: u64, instability_per_unit: f64) -> u64 {
    (units as f64 * instability_per_unit / STABILITY_PER_FORTIFY).ceil() as u64
}
