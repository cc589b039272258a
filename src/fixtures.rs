#[cfg(test)]
pub mod test {
    /// Default config in verbose mode, with one compact line.
    pub const MODEL_DEFAULT: &str = "\
# NOTE: image classifier defaults
# TIMESTAMP: 2024-01-01 00:00:00

[MODEL]
# TYPE: float
# DESC: initial learning rate
learning_rate = 1e-3

# TYPE: int
# DESC: batch size
batch_size = 64

# TYPE: str
# DESC: model storage directory
model_dir = /home/models/test

# compact mode example
(obj) layer_size = [128, 64, 32]
";

    /// Partial config that only overrides existing keys.
    pub const MODEL_OVERRIDE: &str = "\
[MODEL]
(int) batch_size = 128
(float) learning_rate = 0.05
";

    /// Two sections sharing the `dropout` parameter.
    pub const SHARED_NAMES: &str = "\
[ENCODER]
(float) dropout = 0.1
(int) depth = 6

[DECODER]
(float) dropout = 0.2
(int) heads = 8
";

    /// Compact declarations of every kind.
    pub const ALL_KINDS: &str = "\
[ALL]
(str) name = resnet
(int) n = 7
(float) ratio = 0.75
(json) arr = [1,2,3]
(obj) shape = (3, 224, 224)
";

    /// The example from the format description.
    pub const LR_BATCH: &str = "\
[MODEL]
(float) lr = 0.01
(int) batch = 32
";
}
