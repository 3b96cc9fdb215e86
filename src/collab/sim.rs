use crate::types::{NetworkId, SimAuthRequest};

pub trait SimAuthenticator {
    fn identity(&mut self, network_id: NetworkId) -> Option<String>;
    fn authenticate(&mut self, request: &SimAuthRequest) -> Option<String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoSim;

impl SimAuthenticator for NoSim {
    fn identity(&mut self, _network_id: NetworkId) -> Option<String> {
        None
    }

    fn authenticate(&mut self, _request: &SimAuthRequest) -> Option<String> {
        None
    }
}
