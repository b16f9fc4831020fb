use std::io::Write;

use crate::{errors::Result, params::Params, quark::Quark};

use super::tagger::Tagger;

pub trait Model {
    /// Returns a decoder reading this model with the given decoding parameters.
    fn tagger(&self, params: Params) -> impl Tagger + '_;
    fn labels(&self) -> &Quark;
    /// Writes the model in a plain-text format.
    fn dump<W: Write>(&self, w: W) -> Result<()>;
}
