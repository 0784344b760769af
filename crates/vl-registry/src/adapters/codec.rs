//! Car record codec.

use crate::domain::entities::Car;
use crate::domain::errors::CodecError;
use crate::ports::outbound::CarCodec;

/// Plain JSON encoding of car records.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCarCodec;

impl CarCodec for JsonCarCodec {
    fn encode(&self, car: &Car) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(car).map_err(|e| CodecError {
            message: e.to_string(),
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Car, CodecError> {
        serde_json::from_slice(data).map_err(|e| CodecError {
            message: e.to_string(),
        })
    }
}
