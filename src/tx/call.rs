//! Call construction from human-readable ABI fragments

use crate::chain::NodeClient;
use crate::error::{SeederError, SeederResult};

use ethers::abi::{AbiParser, Function, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use std::fmt;

/// Destination of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// Call into a deployed contract
    Contract(Address),
    /// Contract creation; the calldata is the init code
    Create,
}

/// One on-chain call: target, function and arguments, encoded once.
///
/// Immutable after construction. The calldata is derived from the parsed
/// fragment, so argument types are checked before anything touches the
/// network.
#[derive(Debug, Clone)]
pub struct CallSpec {
    target: CallTarget,
    signature: String,
    function: Option<Function>,
    args: Vec<Token>,
    value: U256,
    data: Bytes,
}

impl CallSpec {
    /// Build a call against a human-readable fragment such as
    /// `function approve(address spender, uint256 amount) external returns (bool)`
    pub fn new(target: Address, fragment: &str, args: Vec<Token>) -> SeederResult<Self> {
        let function = parse_fragment(fragment)?;
        let data = function
            .encode_input(&args)
            .map_err(|e| SeederError::Abi(format!("{}: {}", function.name, e)))?;

        Ok(Self {
            target: CallTarget::Contract(target),
            signature: canonical_signature(&function),
            function: Some(function),
            args,
            value: U256::zero(),
            data: data.into(),
        })
    }

    /// Contract creation from already-encoded init code
    pub fn create(label: impl Into<String>, init_code: Bytes, args: Vec<Token>) -> Self {
        Self {
            target: CallTarget::Create,
            signature: label.into(),
            function: None,
            args,
            value: U256::zero(),
            data: init_code,
        }
    }

    /// Target contract address, `None` for contract creation
    pub fn to(&self) -> Option<Address> {
        match self.target {
            CallTarget::Contract(address) => Some(address),
            CallTarget::Create => None,
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn args(&self) -> &[Token] {
        &self.args
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Unsigned request used for simulation (`eth_estimateGas`, `eth_call`)
    pub fn simulation_request(&self, from: Option<Address>) -> TypedTransaction {
        let mut request = TransactionRequest::new()
            .data(self.data.clone())
            .value(self.value);
        if let Some(from) = from {
            request = request.from(from);
        }
        if let Some(to) = self.to() {
            request = request.to(to);
        }
        TypedTransaction::Legacy(request)
    }

    /// Execute the call read-only and decode its outputs
    pub async fn read(
        &self,
        client: &dyn NodeClient,
        from: Option<Address>,
    ) -> SeederResult<Vec<Token>> {
        let function = self.function.as_ref().ok_or_else(|| {
            SeederError::Abi("Contract creation cannot be read".to_string())
        })?;

        let output = client.call(&self.simulation_request(from), None).await?;
        function
            .decode_output(&output)
            .map_err(|e| SeederError::Abi(format!("{}: {}", self.signature, e)))
    }
}

impl fmt::Display for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            CallTarget::Contract(address) => write!(f, "{:?}.{}", address, self.signature),
            CallTarget::Create => write!(f, "create {}", self.signature),
        }
    }
}

/// `name(type,type)` form, without outputs
fn canonical_signature(function: &Function) -> String {
    let inputs: Vec<String> = function
        .inputs
        .iter()
        .map(|param| param.kind.to_string())
        .collect();
    format!("{}({})", function.name, inputs.join(","))
}

fn parse_fragment(fragment: &str) -> SeederResult<Function> {
    AbiParser::default()
        .parse_function(fragment)
        .map_err(|e| SeederError::Abi(format!("Invalid fragment `{}`: {}", fragment, e)))
}
