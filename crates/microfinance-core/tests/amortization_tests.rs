use microfinance_core::amortization::{self, LoanTermsInput, OutstandingInput};
use microfinance_core::{
    calculate_emi, calculate_outstanding_principal, calculate_total_interest, round_currency,
    MicrofinanceError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PRINCIPALS: [Decimal; 4] = [dec!(1000), dec!(50000), dec!(125000.50), dec!(2500000)];
const RATES: [Decimal; 5] = [dec!(1), dec!(6.5), dec!(12), dec!(18), dec!(36)];
const TENURES: [u32; 6] = [1, 6, 12, 24, 60, 240];

// ===========================================================================
// EMI
// ===========================================================================

#[test]
fn test_emi_known_answer_12pct_one_year() {
    // Monthly rate 0.01: 50000 * 0.01 * 1.01^12 / (1.01^12 - 1) = 4442.4394
    assert_eq!(calculate_emi(dec!(50000), dec!(12), 12).unwrap(), dec!(4442.44));
}

#[test]
fn test_emi_known_answer_long_tenure() {
    // 30-year loan at 12%
    assert_eq!(calculate_emi(dec!(100000), dec!(12), 360).unwrap(), dec!(1028.61));
}

#[test]
fn test_emi_known_answers_other_terms() {
    assert_eq!(calculate_emi(dec!(250000), dec!(18), 24).unwrap(), dec!(12481.03));
    assert_eq!(calculate_emi(dec!(500000), dec!(9), 120).unwrap(), dec!(6333.79));
    assert_eq!(calculate_emi(dec!(100000), dec!(12), 60).unwrap(), dec!(2224.44));
}

#[test]
fn test_emi_zero_rate_exact() {
    assert_eq!(calculate_emi(dec!(100000), dec!(0), 10).unwrap(), dec!(10000.00));
}

#[test]
fn test_emi_positive_for_all_valid_inputs() {
    for p in PRINCIPALS {
        for r in RATES.iter().copied().chain([Decimal::ZERO]) {
            for t in TENURES {
                let emi = calculate_emi(p, r, t).unwrap();
                assert!(emi > Decimal::ZERO, "EMI({p}, {r}, {t}) = {emi}");
            }
        }
    }
}

#[test]
fn test_emi_zero_rate_identity() {
    for p in PRINCIPALS {
        for t in TENURES {
            let emi = calculate_emi(p, Decimal::ZERO, t).unwrap();
            assert_eq!(emi, round_currency(p / Decimal::from(t)));
        }
    }
}

#[test]
fn test_emi_is_two_decimal_places() {
    for p in PRINCIPALS {
        for r in RATES {
            let emi = calculate_emi(p, r, 12).unwrap();
            assert_eq!(emi, emi.round_dp(2));
        }
    }
}

#[test]
fn test_emi_rises_with_rate() {
    let mut previous = Decimal::ZERO;
    for r in [dec!(0), dec!(1), dec!(6.5), dec!(12), dec!(18), dec!(36)] {
        let emi = calculate_emi(dec!(50000), r, 24).unwrap();
        assert!(emi > previous, "EMI at {r}% should exceed {previous}");
        previous = emi;
    }
}

#[test]
fn test_emi_zero_tenure_rejected() {
    let err = calculate_emi(dec!(50000), dec!(12), 0).unwrap_err();
    assert!(matches!(err, MicrofinanceError::InvalidInput { ref field, .. } if field == "tenure_months"));
}

#[test]
fn test_emi_non_positive_principal_rejected() {
    for p in [dec!(0), dec!(-100)] {
        let err = calculate_emi(p, dec!(12), 12).unwrap_err();
        assert!(matches!(err, MicrofinanceError::InvalidInput { ref field, .. } if field == "principal"));
    }
}

#[test]
fn test_emi_negative_rate_rejected() {
    let err = calculate_emi(dec!(50000), dec!(-0.5), 12).unwrap_err();
    assert!(matches!(
        err,
        MicrofinanceError::InvalidInput { ref field, .. } if field == "annual_rate_percent"
    ));
}

// ===========================================================================
// Total interest
// ===========================================================================

#[test]
fn test_total_interest_known_answer() {
    // 4442.44 * 12 - 50000
    assert_eq!(
        calculate_total_interest(dec!(50000), dec!(12), 12).unwrap(),
        dec!(3309.28)
    );
    assert_eq!(
        calculate_total_interest(dec!(100000), dec!(12), 60).unwrap(),
        dec!(33466.40)
    );
}

#[test]
fn test_total_interest_positive_for_positive_rates() {
    for p in PRINCIPALS {
        for r in RATES {
            for t in TENURES {
                let interest = calculate_total_interest(p, r, t).unwrap();
                assert!(interest > Decimal::ZERO, "interest({p}, {r}, {t}) = {interest}");
            }
        }
    }
}

#[test]
fn test_total_interest_zero_rate_is_rounding_residue() {
    for p in PRINCIPALS {
        for t in TENURES {
            let interest = calculate_total_interest(p, Decimal::ZERO, t).unwrap();
            let emi = calculate_emi(p, Decimal::ZERO, t).unwrap();
            assert_eq!(interest, round_currency(emi * Decimal::from(t) - p));
            // each installment is off by at most half a paisa
            assert!(interest.abs() <= dec!(0.005) * Decimal::from(t));
        }
    }
}

#[test]
fn test_total_interest_inherits_validation() {
    assert!(calculate_total_interest(dec!(50000), dec!(12), 0).is_err());
    assert!(calculate_total_interest(dec!(0), dec!(12), 12).is_err());
    assert!(calculate_total_interest(dec!(50000), dec!(-1), 12).is_err());
}

// ===========================================================================
// Outstanding principal
// ===========================================================================

#[test]
fn test_outstanding_fully_paid_after_term() {
    let outstanding =
        calculate_outstanding_principal(dec!(50000), dec!(4442.44), dec!(12), 12).unwrap();
    assert_eq!(outstanding, Decimal::ZERO);
}

#[test]
fn test_outstanding_known_answers_midway() {
    assert_eq!(
        calculate_outstanding_principal(dec!(100000), dec!(2224.44), dec!(12), 30).unwrap(),
        dec!(57407.99)
    );
    assert_eq!(
        calculate_outstanding_principal(dec!(250000), dec!(12481.03), dec!(18), 12).unwrap(),
        dec!(136136.79)
    );
}

#[test]
fn test_outstanding_full_amortization_within_tolerance() {
    // The rounded EMI leaves a residual that grows with tenure: about 9 for
    // (100000, 12%, 360). The 0.5 bound only holds for short tenures.
    for p in [dec!(5000), dec!(50000), dec!(250000)] {
        for r in [dec!(6), dec!(12), dec!(18)] {
            for t in [6u32, 12, 24, 36, 60] {
                let emi = calculate_emi(p, r, t).unwrap();
                let outstanding = calculate_outstanding_principal(p, emi, r, t).unwrap();
                assert!(
                    outstanding <= dec!(0.5),
                    "residual {outstanding} for ({p}, {r}, {t})"
                );
            }
        }
    }
}

#[test]
fn test_outstanding_monotonic_then_clamped() {
    for r in [dec!(0), dec!(12), dec!(24)] {
        let emi = calculate_emi(dec!(75000), r, 18).unwrap();
        let mut previous = dec!(75000);
        let mut reached_zero = false;
        for k in 1..=30u32 {
            let outstanding = calculate_outstanding_principal(dec!(75000), emi, r, k).unwrap();
            if reached_zero {
                assert_eq!(outstanding, Decimal::ZERO, "balance left zero at month {k}");
            } else {
                assert!(outstanding < previous, "balance did not fall at month {k}");
            }
            reached_zero = outstanding.is_zero();
            previous = outstanding;
        }
        assert!(reached_zero);
    }
}

#[test]
fn test_outstanding_never_negative() {
    for p in PRINCIPALS {
        for r in RATES.iter().copied().chain([Decimal::ZERO]) {
            let emi = calculate_emi(p, r, 12).unwrap();
            for k in [0u32, 1, 6, 12, 13, 48] {
                for installment in [emi, emi * dec!(3), Decimal::ZERO] {
                    let outstanding =
                        calculate_outstanding_principal(p, installment, r, k).unwrap();
                    assert!(outstanding >= Decimal::ZERO);
                }
            }
        }
    }
}

#[test]
fn test_outstanding_zero_rate_straight_line() {
    assert_eq!(
        calculate_outstanding_principal(dec!(100000), dec!(10000), dec!(0), 3).unwrap(),
        dec!(70000.00)
    );
    assert_eq!(
        calculate_outstanding_principal(dec!(100000), dec!(10000), dec!(0), 15).unwrap(),
        Decimal::ZERO
    );
}

#[test]
fn test_outstanding_validation() {
    assert!(calculate_outstanding_principal(dec!(0), dec!(100), dec!(12), 1).is_err());
    assert!(calculate_outstanding_principal(dec!(1000), dec!(100), dec!(-12), 1).is_err());
    assert!(calculate_outstanding_principal(dec!(1000), dec!(-100), dec!(12), 1).is_err());
}

// ===========================================================================
// Decimal range
// ===========================================================================

#[test]
fn test_emi_growth_factor_overflow() {
    // 1.1^100000 is far beyond 28 significant digits
    let err = calculate_emi(dec!(1000), dec!(120), 100_000).unwrap_err();
    match err {
        MicrofinanceError::FinancialImpossibility(msg) => assert!(msg.contains("EMI")),
        other => panic!("Expected FinancialImpossibility, got {other:?}"),
    }
}

#[test]
fn test_outstanding_growth_factor_overflow() {
    let err = calculate_outstanding_principal(dec!(50000), dec!(4442.44), dec!(12), 10_000)
        .unwrap_err();
    assert!(matches!(err, MicrofinanceError::FinancialImpossibility(_)));
}

#[test]
fn test_emi_smallest_monthly_rate_keeps_denominator_nonzero() {
    // 1.2e-25 % p.a. is a monthly rate of 1e-28, the smallest non-zero Decimal
    let emi = calculate_emi(dec!(1200), dec!(0.00000000000000000000000012), 12).unwrap();
    assert!((emi - dec!(100)).abs() <= dec!(0.01), "emi {emi}");
}

#[test]
fn test_analyze_loan_overflow_matches_total_interest() {
    let input = LoanTermsInput {
        principal: Decimal::MAX,
        annual_rate_percent: dec!(0),
        tenure_months: 2,
    };
    assert!(matches!(
        calculate_total_interest(input.principal, input.annual_rate_percent, 2),
        Err(MicrofinanceError::FinancialImpossibility(_))
    ));
    assert!(matches!(
        amortization::analyze_loan(&input),
        Err(MicrofinanceError::FinancialImpossibility(_))
    ));
}

#[test]
fn test_analyze_outstanding_amount_paid_overflow() {
    let out = amortization::analyze_outstanding(&OutstandingInput {
        principal: dec!(1000),
        installment: dec!(50000000000000000000000000000),
        annual_rate_percent: dec!(0),
        months_paid: 2,
        tenure_months: None,
    });
    assert!(matches!(
        out,
        Err(MicrofinanceError::FinancialImpossibility(_))
    ));
}

// ===========================================================================
// Envelope operations
// ===========================================================================

#[test]
fn test_analyze_loan_envelope() {
    let out = amortization::analyze_loan(&LoanTermsInput {
        principal: dec!(100000),
        annual_rate_percent: dec!(12),
        tenure_months: 60,
    })
    .unwrap();

    assert_eq!(out.result.emi, dec!(2224.44));
    assert_eq!(out.result.total_payable, dec!(133466.40));
    assert_eq!(out.result.total_interest, dec!(33466.40));
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert_eq!(out.metadata.rounding, "2dp_half_away_from_zero");
}

#[test]
fn test_analyze_loan_usurious_rate_warning() {
    let out = amortization::analyze_loan(&LoanTermsInput {
        principal: dec!(10000),
        annual_rate_percent: dec!(120),
        tenure_months: 12,
    })
    .unwrap();
    assert!(out.warnings.iter().any(|w| w.contains("exceeds 100%")));
}

#[test]
fn test_analyze_outstanding_midway() {
    let out = amortization::analyze_outstanding(&OutstandingInput {
        principal: dec!(100000),
        installment: dec!(2224.44),
        annual_rate_percent: dec!(12),
        months_paid: 30,
        tenure_months: Some(60),
    })
    .unwrap();

    assert_eq!(out.result.outstanding_principal, dec!(57407.99));
    assert_eq!(out.result.principal_repaid, dec!(42592.01));
    assert_eq!(out.result.amount_paid, dec!(66733.20));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_analyze_outstanding_json_round_trip_of_input() {
    let json = r#"{
        "principal": "50000",
        "installment": "4442.44",
        "annual_rate_percent": "12",
        "months_paid": 12
    }"#;
    let input: OutstandingInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.tenure_months, None);
    let out = amortization::analyze_outstanding(&input).unwrap();
    assert_eq!(out.result.outstanding_principal, Decimal::ZERO);
}
