pub mod assembler;
pub mod bedrock;
pub mod interface;

#[cfg(test)]
pub mod testing;

pub use assembler::assemble;
pub use bedrock::BedrockAgentRuntime;
pub use interface::*;
