mod batch_norm;
mod channel_bias_add;
mod conv2d;
mod depthwise_conv2d;
mod instance_norm;
mod leaky_relu;
mod local_response_norm;

pub(in crate::nn) use batch_norm::BatchNorm;
pub(in crate::nn) use channel_bias_add::ChannelBiasAdd;
pub(in crate::nn) use conv2d::Conv2d;
pub(in crate::nn) use depthwise_conv2d::DepthwiseConv2d;
pub(in crate::nn) use instance_norm::InstanceNorm;
pub(in crate::nn) use leaky_relu::LeakyReLU;
pub(in crate::nn) use local_response_norm::LocalResponseNorm;
