mod retrieval_properties;
