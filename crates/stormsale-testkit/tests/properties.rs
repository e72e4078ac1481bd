//! Property tests over the envelope protocol.

use proptest::prelude::*;
use tokio::runtime::Runtime;

use stormsale_core::SalePayload;
use stormsale_crypto::{CryptoError, KeyUnwrapper, SymmetricKey, WrappedKey};
use stormsale_envelope::{
    AccessGrantProtocol, EnvelopeBuilder, EnvelopeError, KeyHolder, MemoryDirectory, Wallet,
};
use stormsale_testkit::generators::{sale_payload, wallet, SalePayloadParams};

fn directory_with(wallets: &[&Wallet]) -> MemoryDirectory {
    let directory = MemoryDirectory::new();
    for w in wallets {
        directory.register(w.registration().unwrap()).unwrap();
    }
    directory
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_recipient_opens_the_same_payload(
        params in any::<SalePayloadParams>(),
        advertiser in wallet(),
        affiliate in wallet(),
        auditor in wallet(),
    ) {
        prop_assume!(advertiser.address() != affiliate.address());
        prop_assume!(auditor.address() != advertiser.address());
        prop_assume!(auditor.address() != affiliate.address());

        let rt = Runtime::new().unwrap();
        let directory = directory_with(&[&advertiser, &affiliate, &auditor]);
        let payload = sale_payload(&params);

        let mut envelope = rt
            .block_on(EnvelopeBuilder::new(&directory).create_envelope(
                &payload,
                &advertiser.address(),
                &affiliate.address(),
            ))
            .unwrap();
        prop_assert_eq!(envelope.recipients().len(), 2);

        let k1 = advertiser.unwrap_key(&envelope.advertiser().wrapped_key).unwrap();
        let k2 = affiliate.unwrap_key(&envelope.affiliate().wrapped_key).unwrap();
        prop_assert_eq!(k1.as_bytes(), k2.as_bytes());

        let record = rt
            .block_on(AccessGrantProtocol::new(&directory).grant_as(
                &envelope,
                &affiliate,
                &auditor.address(),
            ))
            .unwrap();
        envelope.add_recipient(record).unwrap();

        for holder in [&advertiser, &affiliate, &auditor] {
            let opened: SalePayload = envelope.open(holder).unwrap();
            prop_assert_eq!(&opened, &payload);
        }
    }

    #[test]
    fn foreign_wrapped_key_never_authorizes(
        advertiser in wallet(),
        affiliate in wallet(),
        outsider in wallet(),
    ) {
        prop_assume!(advertiser.address() != affiliate.address());

        let rt = Runtime::new().unwrap();
        let directory = directory_with(&[&advertiser, &affiliate, &outsider]);
        let envelope = rt
            .block_on(EnvelopeBuilder::new(&directory).create_envelope(
                &serde_json::json!({ "amount": 100 }),
                &advertiser.address(),
                &affiliate.address(),
            ))
            .unwrap();

        let unrelated = SymmetricKey::generate().unwrap();
        let foreign = WrappedKey::wrap(&unrelated, &outsider.encryption_public_key()).unwrap();

        let result = rt.block_on(AccessGrantProtocol::new(&directory).grant_access(
            &envelope,
            &outsider,
            &foreign,
            &outsider.address(),
        ));
        prop_assert!(matches!(result, Err(EnvelopeError::NotAuthorized)));
        prop_assert_eq!(envelope.recipients().len(), 2);
    }

    #[test]
    fn stranger_cannot_unwrap(holder in wallet(), stranger in wallet()) {
        prop_assume!(holder.address() != stranger.address());

        let key = SymmetricKey::generate().unwrap();
        let wrapped = WrappedKey::wrap(&key, &holder.encryption_public_key()).unwrap();
        prop_assert!(matches!(
            stranger.unwrap_key(&wrapped),
            Err(CryptoError::UnwrapFailed)
        ));
    }
}
