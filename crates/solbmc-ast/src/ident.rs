/// A source-level name as produced by the frontend.
///
/// The frontend resolves scoping and gives every declaration a definite
/// name; this type carries no span because the AST is plain deserialized
/// data rather than the output of a local parser.
pub type Ident = String;
