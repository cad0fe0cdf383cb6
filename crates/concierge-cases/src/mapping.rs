// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent to case-type mapping.

use std::collections::BTreeMap;
use std::str::FromStr;

use concierge_config::model::CaseFlowConfig;
use concierge_core::{CaseType, Intent};

/// Maps an intent to the case type it opens.
///
/// Social intents never map, whatever `flows` says. Configured trigger intents
/// are consulted before the built-in table.
pub fn detect_case_type(
    intent: Intent,
    flows: &BTreeMap<String, CaseFlowConfig>,
) -> Option<CaseType> {
    if intent.is_social() {
        return None;
    }

    for (case_type, flow) in flows {
        if flow.trigger_intents.iter().any(|t| t == intent.as_str()) {
            match CaseType::from_str(case_type) {
                Ok(case_type) => return Some(case_type),
                Err(_) => {
                    tracing::warn!(case_type = %case_type, "ignoring case flow with unknown type");
                }
            }
        }
    }

    built_in(intent)
}

fn built_in(intent: Intent) -> Option<CaseType> {
    use Intent::*;
    let case_type = match intent {
        ProductLookupByCode | ProductLookupByImage | ProductAvailability | ProductSearch
        | ProductInterest | PurchaseIntent | PriceInquiry | PriceNegotiation => {
            CaseType::ProductInquiry
        }
        PaymentSlipVerify | ChangePaymentMethod | CheckoutConfirm | DepositFlow | DepositNew
        | OrderCheck | OrderStatus => CaseType::PaymentFull,
        InstallmentCheck | InstallmentFlow | InstallmentNew | InstallmentPay
        | InstallmentExtend | InstallmentInquiry => CaseType::PaymentInstallment,
        SavingsCheck | SavingsNew | SavingsDeposit | SavingsInquiry => CaseType::PaymentSavings,
        PawnCheck | PawnNew | PawnInquiry | PawnPayInterest | PawnRedeem => CaseType::Pawn,
        RepairCheck | RepairNew | RepairInquiry => CaseType::Repair,
        _ => return None,
    };
    Some(case_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flows_triggering(intents: &[&str], case_type: &str) -> BTreeMap<String, CaseFlowConfig> {
        let flow = CaseFlowConfig {
            trigger_intents: intents.iter().map(|s| s.to_string()).collect(),
            ..CaseFlowConfig::default()
        };
        BTreeMap::from([(case_type.to_string(), flow)])
    }

    #[test]
    fn greetings_never_open_cases_even_when_configured() {
        let flows = flows_triggering(
            &["greeting", "thanks", "goodbye", "unknown", "fallback", "chitchat"],
            "product_inquiry",
        );
        for label in ["greeting", "hello", "thanks", "goodbye", "unknown", "fallback"] {
            assert_eq!(
                detect_case_type(Intent::parse_label(label), &flows),
                None,
                "{label}"
            );
        }
    }

    #[test]
    fn configured_triggers_win_over_built_in_table() {
        let flows = flows_triggering(&["price_inquiry"], "payment_full");
        assert_eq!(
            detect_case_type(Intent::PriceInquiry, &flows),
            Some(CaseType::PaymentFull)
        );
        assert_eq!(
            detect_case_type(Intent::PriceInquiry, &BTreeMap::new()),
            Some(CaseType::ProductInquiry)
        );
    }

    #[test]
    fn built_in_table_covers_service_intents() {
        let none = BTreeMap::new();
        assert_eq!(detect_case_type(Intent::PawnRedeem, &none), Some(CaseType::Pawn));
        assert_eq!(detect_case_type(Intent::RepairNew, &none), Some(CaseType::Repair));
        assert_eq!(
            detect_case_type(Intent::InstallmentPay, &none),
            Some(CaseType::PaymentInstallment)
        );
        assert_eq!(
            detect_case_type(Intent::SavingsDeposit, &none),
            Some(CaseType::PaymentSavings)
        );
        assert_eq!(detect_case_type(Intent::AdminHandoff, &none), None);
        assert_eq!(detect_case_type(Intent::RequestVideoCall, &none), None);
    }
}
