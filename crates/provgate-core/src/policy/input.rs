//! Building engine inputs from attestation signatures.

use crate::attestation::AttestationSignature;
use crate::engine::InputDocument;
use crate::error::{GateError, GateResult};

/// Synthetic file name of the `index`-th input.
pub fn input_name(index: usize) -> String {
    format!("attestation-{}.json", index)
}

/// One input document per signature, in signature order.
///
/// The whole statement is passed through so rules can address any field.
pub fn build_inputs(signatures: &[AttestationSignature]) -> GateResult<Vec<InputDocument>> {
    signatures
        .iter()
        .enumerate()
        .map(|(index, signature)| {
            let content: serde_json::Value =
                serde_json::from_slice(&signature.payload).map_err(|e| GateError::InputBuild {
                    index,
                    reason: e.to_string(),
                })?;

            if !content.is_object() {
                return Err(GateError::InputBuild {
                    index,
                    reason: "attestation payload is not a JSON object".to_string(),
                });
            }

            Ok(InputDocument {
                name: input_name(index),
                content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_named_by_position() {
        let signatures = vec![
            AttestationSignature::new(br#"{"predicateType":"a"}"#.to_vec()),
            AttestationSignature::new(br#"{"predicateType":"b"}"#.to_vec()),
        ];
        let inputs = build_inputs(&signatures).unwrap();
        assert_eq!(inputs[0].name, "attestation-0.json");
        assert_eq!(inputs[1].name, "attestation-1.json");
        assert_eq!(inputs[1].content["predicateType"], "b");
    }

    #[test]
    fn test_empty_signatures_yield_no_inputs() {
        assert!(build_inputs(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_payload_reports_index() {
        let signatures = vec![
            AttestationSignature::new(b"{}".to_vec()),
            AttestationSignature::new(b"not json".to_vec()),
        ];
        match build_inputs(&signatures).unwrap_err() {
            GateError::InputBuild { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let signatures = vec![AttestationSignature::new(b"[1,2]".to_vec())];
        assert!(matches!(
            build_inputs(&signatures),
            Err(GateError::InputBuild { index: 0, .. })
        ));
    }
}
