//! Wiring of the lifecycle client from configuration.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use gtx_contracts::implementations::evm::alloy::{connect, AlloyRouter, AlloyToken};
use gtx_contracts::RouterInterface;
use gtx_domains::DomainResolver;
use gtx_lifecycle::OrderLifecycleClient;
use gtx_types::GtxConfig;
use std::sync::Arc;

/// Builds a client for orders originating on `origin`.
///
/// Without a signer the client can only read; submissions will be rejected
/// by the node.
pub fn build_client(
	config: &GtxConfig,
	origin: &str,
	signer: Option<PrivateKeySigner>,
) -> Result<Arc<OrderLifecycleClient>> {
	let network = config
		.chains
		.network(origin)
		.with_context(|| format!("Network {} is not configured", origin))?;
	let rpc_url = network
		.rpc_url
		.as_deref()
		.with_context(|| format!("Network {} has no rpc_url", origin))?;

	let sender = signer
		.as_ref()
		.map(|signer| signer.address())
		.unwrap_or(Address::ZERO);

	let provider = connect(rpc_url, network.chain_id, signer)
		.with_context(|| format!("Failed to connect to {}", origin))?;
	let router = Arc::new(AlloyRouter::new(network.router, provider.clone()));

	let resolver = Arc::new(build_resolver(config, origin, router.clone())?);

	let client = OrderLifecycleClient::builder(origin)
		.with_sender(sender)
		.with_resolver(resolver)
		.with_router(router.clone())
		.with_tokens(Arc::new(AlloyToken::new(provider)))
		.with_receipts(router)
		.with_settings(config.client.clone())
		.build()
		.context("Failed to build lifecycle client")?;

	Ok(Arc::new(client))
}

/// Registers live domain readers for every network that declares an
/// accessor and can be reached.
fn build_resolver(
	config: &GtxConfig,
	origin: &str,
	origin_router: Arc<AlloyRouter>,
) -> Result<DomainResolver> {
	let mut resolver = DomainResolver::new(Arc::new(config.chains.clone()))
		.with_read_timeout(config.client.rpc_timeout());

	for (name, network) in &config.chains.networks {
		if network.domain_accessor.is_none() {
			continue;
		}

		let reader: Arc<dyn RouterInterface> = if name == origin {
			origin_router.clone()
		} else {
			match &network.rpc_url {
				Some(rpc_url) => {
					let provider = connect(rpc_url, network.chain_id, None)
						.with_context(|| format!("Failed to connect to {}", name))?;
					Arc::new(AlloyRouter::new(network.router, provider))
				}
				None => {
					tracing::debug!(network = %name, "No rpc_url, using configured domain");
					continue;
				}
			}
		};

		resolver = resolver.with_reader(name.clone(), reader);
	}

	Ok(resolver)
}
