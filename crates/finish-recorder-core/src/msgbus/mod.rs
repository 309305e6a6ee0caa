mod bus;
mod failure;

pub use {
    bus::{Handler, HandlerFuture, MessageBus},
    failure::{BusResponse, FailureKind},
};
