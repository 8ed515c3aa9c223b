use proptest::prelude::*;
use sdk::errors::{BowErrorExt, EngineError};
use sdk::types::{ControllerInput, MotionAction, MotionParams};

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::MalformedInstruction(error_str.clone()),
            EngineError::PersistenceFailure(error_str.clone()),
            EngineError::Config(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            // Hints are static sentences, never echoes of the raw detail
            if error_str.len() > 8 {
                prop_assert!(!hint.contains(error_str.as_str()));
            }
        }
    }
}

proptest! {
    #[test]
    fn test_motion_keyword_inference(prefix in "[0-9 ]{0,6}", index in 0usize..7) {
        let (keyword, expected) = MotionAction::KEYWORDS[index];
        let text = format!("{}{} 1", prefix, keyword);
        prop_assert_eq!(MotionAction::from_text(&text), Some(expected));
    }
}

proptest! {
    #[test]
    fn test_params_serialization_round_trip(
        dx in -4000i32..4000,
        dy in -4000i32..4000,
        dz in -4000i32..4000,
        velocity in 1i32..40,
    ) {
        // Quarter steps are exact in binary and in decimal
        let quarter = |v: i32| f64::from(v) / 4.0;
        let params = MotionParams::new(quarter(dx), quarter(dy), quarter(dz), quarter(velocity));
        let json = serde_json::to_string(&params).unwrap();
        let parsed: MotionParams = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(params, parsed);
    }
}

proptest! {
    #[test]
    fn test_clear_buttons_keeps_axes(a in any::<i32>(), lx in any::<i32>(), ry in any::<i32>()) {
        let mut input = ControllerInput {
            a,
            b: 1,
            x: 1,
            y: 1,
            left_thumbstick_x: lx,
            right_thumbstick_y: ry,
            ..Default::default()
        };
        input.clear_buttons();
        prop_assert_eq!((input.a, input.b, input.x, input.y), (0, 0, 0, 0));
        prop_assert_eq!(input.left_thumbstick_x, lx);
        prop_assert_eq!(input.right_thumbstick_y, ry);
    }
}
