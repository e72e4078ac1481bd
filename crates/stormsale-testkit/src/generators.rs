//! Proptest generators for property-based testing.

use proptest::prelude::*;

use stormsale_core::{Address, Keypair, Role, SalePayload, ADDRESS_LEN};
use stormsale_envelope::Wallet;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a wallet with a signature-derived encryption key.
pub fn wallet() -> impl Strategy<Value = Wallet> {
    keypair().prop_map(Wallet::from_signing_keypair)
}

/// Generate a random address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; ADDRESS_LEN]>().prop_map(Address::from_bytes)
}

/// Generate a role.
pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Advertiser),
        Just(Role::Affiliate),
        Just(Role::Auditor),
    ]
}

/// Generate a reasonable timestamp (Unix ms).
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000i64
}

/// Parameters for generating a sale payload.
#[derive(Debug, Clone)]
pub struct SalePayloadParams {
    pub product: String,
    pub customer: String,
    pub amount: u64,
    pub timestamp: i64,
    pub metadata: Option<String>,
}

impl Arbitrary for SalePayloadParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            "[A-Za-z0-9 ]{1,40}",
            "[a-z0-9@. ]{0,40}",
            any::<u64>(),
            timestamp(),
            proptest::option::of(".{0,200}"),
        )
            .prop_map(|(product, customer, amount, timestamp, metadata)| SalePayloadParams {
                product,
                customer,
                amount,
                timestamp,
                metadata,
            })
            .boxed()
    }
}

/// Build a sale payload from parameters.
pub fn sale_payload(params: &SalePayloadParams) -> SalePayload {
    let mut payload = SalePayload::new(params.product.clone(), params.amount, params.timestamp)
        .with_customer(params.customer.clone());
    if let Some(metadata) = &params.metadata {
        payload = payload.with_metadata(metadata.clone());
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use stormsale_core::{from_canonical_bytes, to_canonical_bytes};

    proptest! {
        #[test]
        fn test_canonical_bytes_deterministic(params: SalePayloadParams) {
            let b1 = to_canonical_bytes(&sale_payload(&params)).unwrap();
            let b2 = to_canonical_bytes(&sale_payload(&params)).unwrap();
            prop_assert_eq!(b1, b2);
        }

        #[test]
        fn test_canonical_decode_inverts_encode(params: SalePayloadParams) {
            let payload = sale_payload(&params);
            let bytes = to_canonical_bytes(&payload).unwrap();
            prop_assert_eq!(from_canonical_bytes::<SalePayload>(&bytes).unwrap(), payload);
        }

        #[test]
        fn test_address_display_parses_back(addr in address()) {
            prop_assert_eq!(Address::parse(&addr.to_string()).unwrap(), addr);
        }

        #[test]
        fn test_role_code_roundtrip(r in role()) {
            prop_assert_eq!(Role::from_u8(r.to_u8()).unwrap(), r);
        }
    }
}
