mod layer_conv;
mod node_conv2d;
mod node_depthwise_conv2d;
