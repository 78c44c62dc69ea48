//! Flex-message structure generation and interpretation.
//!
//! Two directions, one target shape: [`generate`] assembles a document from
//! flex-* blocks, and [`normalize`] loads any previously stored
//! representation back into the same bubble/carousel shape the simulator
//! renders.

pub mod document;
pub mod generate;
pub mod normalize;

pub use document::{
    FlexAction, FlexBox, FlexBubble, FlexButton, FlexComponent, FlexDocument, FlexImage,
    FlexSeparator, FlexSpacer, FlexText,
};
pub use generate::generate;
pub use normalize::normalize;
