use crate::ParamKind;

/// Maps variable slots to parameter kinds.
///
/// The training framework's save format decides which slot holds which parameter. This trait
/// is the only place that knowledge lives; a change upstream only needs a new adapter.
pub trait SlotAdapter: core::fmt::Debug {
    /// The kind of parameter stored in `slot`, or `None` if the slot is not exported.
    fn classify(&self, slot: usize) -> Option<ParamKind>;
}

/// Keras layout: slot 0 is the kernel, slot 1 the bias, every other slot is ignored.
///
/// Layers with extra state (e.g. the moving statistics of a batch normalization) only export
/// their first two variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct KerasSlotAdapter;

impl SlotAdapter for KerasSlotAdapter {
    fn classify(&self, slot: usize) -> Option<ParamKind> {
        match slot {
            0 => Some(ParamKind::Kernel),
            1 => Some(ParamKind::Bias),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(ParamKind::Kernel))]
    #[case(1, Some(ParamKind::Bias))]
    #[case(2, None)]
    #[case(10, None)]
    fn keras_slots(#[case] slot: usize, #[case] expected: Option<ParamKind>) {
        assert_eq!(KerasSlotAdapter.classify(slot), expected);
    }
}
